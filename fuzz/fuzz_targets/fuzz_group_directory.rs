#![no_main]

use libfuzzer_sys::fuzz_target;
use tile_icons::icon::{parse_group_directory, select_largest};

fuzz_target!(|data: &[u8]| {
    if let Ok(entries) = parse_group_directory(data) {
        assert!(6 + entries.len() * 14 <= data.len());
        if let Some(best) = select_largest(&entries) {
            assert!(entries.iter().all(|e| e.dimension() <= best.dimension()));
        }
    }
});
