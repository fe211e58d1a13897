// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Analyze a STEP file from the command line and print the result as
//! JSON. Handy for eyeballing what the analyzer extracts from a real
//! export:
//!
//! ```text
//! cargo run --example analyze_file -- path/to/model.stp
//! ```

use step_lite_analysis::{analyze, parse_model_info, Limits};
use std::fs;

fn main() {
    let path = std::env::args()
        .nth(1)
        .expect("usage: analyze_file <path-to-step-file>");

    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {path}: {e}"));

    println!("File size: {} bytes", content.len());

    let info = parse_model_info(&content);
    println!(
        "\n=== Model Info ===\n{}",
        serde_json::to_string_pretty(&info).expect("serialize model info")
    );

    let analysis = analyze(&content, &Limits::default());
    println!(
        "\n=== Analysis ===\n{}",
        serde_json::to_string_pretty(&analysis).expect("serialize analysis")
    );

    if analysis.entities_truncated {
        println!("\nnote: scan truncated; raise max_entities for a full pass");
    }
}
