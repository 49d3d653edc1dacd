#![no_main]
use libfuzzer_sys::fuzz_target;
use zmark::{from_bytes, Config, Filter};

fuzz_target!(|data: &[u8]| {
    for config in [Config::xml(), Config::html()] {
        if let Ok(doc) = from_bytes(data, config) {
            let _ = doc.search(Filter::any()).count();
        }
    }
});
