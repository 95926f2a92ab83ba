#![no_main]

use libfuzzer_sys::fuzz_target;
use tile_icons::config::LauncherConfig;

fuzz_target!(|data: &[u8]| {
    // Arbitrary config.json contents must parse or fail, never panic
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(config) = serde_json::from_str::<LauncherConfig>(text) {
            let _ = config.supports_extension(".exe");
        }
    }
});
