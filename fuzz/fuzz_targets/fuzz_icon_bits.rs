#![no_main]

use libfuzzer_sys::fuzz_target;
use tile_icons::icon::icon_from_resource_bits;

fuzz_target!(|data: &[u8]| {
    // Raw RT_ICON payloads: PNG or headerless DIB
    let _ = icon_from_resource_bits(data);
});
