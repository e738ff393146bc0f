/// Caravan example — plays the bundled desert crossing without input.
///
/// The player always takes the first option it can: the first free toggle
/// during customization, the first enabled choice on every page.
///
/// Run with: cargo run --example caravan [seed]

use choice_engine::core::lint::lint_content;
use choice_engine::core::session::{Phase, Session};
use choice_engine::schema::GameContent;
use std::path::Path;

/// Stops a broken story from looping forever.
const MAX_PICKS: usize = 200;

fn main() {
    let seed: u64 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(2026);

    // --- Load and check the story ---
    let content = GameContent::load_dir(Path::new("demos/caravan"))
        .expect("Failed to load caravan story");

    let report = lint_content(&content);
    for warning in &report.warnings {
        println!("lint warning: {}", warning);
    }
    assert!(report.errors.is_empty(), "lint errors: {:?}", report.errors);

    let mut session = Session::builder()
        .seed(seed)
        .content(content)
        .build()
        .expect("Failed to build session");

    println!("=== The Salt Road (seed {}) ===\n", seed);
    session.start();

    for _ in 0..MAX_PICKS {
        for block in session.take_blocks() {
            if let Some(heading) = &block.heading {
                println!("--- {} ---", heading);
            }
        }
        if session.phase() == Phase::Summary {
            break;
        }

        let next = session
            .enabled_options()
            .find(|o| !o.active && !o.picked)
            .map(|o| (o.id.clone(), o.label().to_string()));
        let Some((id, label)) = next else {
            println!("No option left to pick.");
            break;
        };

        println!("> {}", label);
        session.activate(&id).expect("enabled option rejected");

        let status = session.status();
        let line: Vec<&str> = status.resources.iter().map(|s| s.text.as_str()).collect();
        println!("  [{}]", line.join(" | "));
    }

    match session.summary() {
        Some(summary) => println!("\n{}", summary.to_text()),
        None => println!("\nThe story did not reach its summary."),
    }
}
