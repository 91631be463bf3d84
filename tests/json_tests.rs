mod common;

use common::{load_scenario, run_scenario, translate};
use std::fs;

#[test]
fn json_validation_tests() {
    let test_dir = "./test_data";
    let mut passed = 0;

    let mut entries: Vec<_> = fs::read_dir(test_dir)
        .expect("test_data directory")
        .filter_map(Result::ok)
        .collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let scenario = load_scenario(&path)
            .unwrap_or_else(|e| panic!("failed to load {}: {}", path.display(), e));

        // Covers depend only on offsets from the viewer
        for variant in [scenario.clone(), translate(&scenario, 7, -11)] {
            if let Err(reason) = run_scenario(&variant) {
                panic!("Scenario '{}' failed: {}", variant.name, reason);
            }
        }
        passed += 1;
    }

    assert!(passed > 0, "no scenarios found in {}", test_dir);
    println!("All {} JSON scenarios passed", passed);
}
