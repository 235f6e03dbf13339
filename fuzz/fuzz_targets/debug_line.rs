#![no_main]

use dwsrc::{read::DebugLine, DebugLineOffset, LittleEndian};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|debug_line: &[u8]| {
    let debug_line = DebugLine::new(debug_line, LittleEndian);

    let offset = DebugLineOffset(0);
    let address_size = 8;
    if let Ok(header) = debug_line.program_header(offset, address_size, None) {
        for file in header.file_names() {
            let _ = file.path_name();
            let _ = file.directory(&header);
        }
    }
});
