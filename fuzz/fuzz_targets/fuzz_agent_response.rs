#![no_main]

use libfuzzer_sys::fuzz_target;
use noosphere::game::{parse_response, strip_code_fence, Action};

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    // Fence stripping only ever narrows the input
    let inner = strip_code_fence(raw);
    assert!(inner.len() <= raw.len());

    // Parsing must not panic; anything it accepts must re-serialize
    if let Ok(response) = parse_response(raw) {
        for action in &response.actions {
            let json = serde_json::to_string(action).expect("actions serialize");
            let back: Action = serde_json::from_str(&json).expect("actions deserialize");
            assert_eq!(&back, action);
        }
    }
});
