#![no_main]
use libfuzzer_sys::fuzz_target;
use zmark::{parse_with_config, Config};

// Serialized output must always parse again with the same options.
fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    for config in [Config::xml(), Config::html()] {
        if let Ok(doc) = parse_with_config(input, config) {
            let output = doc.outer();
            if let Err(err) = parse_with_config(&output, config) {
                panic!("reparse failed: {err}\ninput: {input:?}\noutput: {output:?}");
            }
        }
    }
});
