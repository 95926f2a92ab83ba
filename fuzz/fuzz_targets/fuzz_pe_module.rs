#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Write;
use tile_icons::icon::extract_high_resolution;

fuzz_target!(|data: &[u8]| {
    // The module is opened from disk, so every input goes through a temp file
    let Ok(mut file) = tempfile::NamedTempFile::new() else {
        return;
    };
    if file.write_all(data).is_err() {
        return;
    }
    let _ = extract_high_resolution(file.path());
});
