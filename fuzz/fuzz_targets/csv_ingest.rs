#![no_main]

use libfuzzer_sys::fuzz_target;
use satwatch::dataset::extract_lenient;
use satwatch::io::read_csv;

fuzz_target!(|data: &[u8]| {
    // Malformed tables must surface as errors or row faults, never panics
    if let Ok(rows) = read_csv(data) {
        let out = extract_lenient(&rows);
        assert_eq!(out.matrix.len() + out.faults.len(), rows.len());
    }
});
