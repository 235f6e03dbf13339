#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(files) = dwsrc::source_files_from_bytes(data, &dwsrc::ExtractOptions::default()) {
        assert!(files.windows(2).all(|pair| pair[0] < pair[1]));
    }
});
