//! RMT stress-test runner.
//!
//! Command-line entry point for convergence stress runs across the RMT
//! crate family: the replicated move-tree, the counter CRDTs, and the
//! filesystem projection.


use stress_test::{stress_test_counters, stress_test_fs, stress_test_tree};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("tree") => run_tree(),
        Some("counters") => run_counters(),
        Some("fs") => run_fs(),
        Some("full") => run_full(),
        Some("quick") | None => run_quick(),
        Some("help") | Some("--help") | Some("-h") => print_usage(),
        Some(other) => {
            println!("Unknown suite: {}", other);
            print_usage();
        }
    }
}

fn print_usage() {
    println!("RMT stress-test runner");
    println!();
    println!("Usage: cargo run [suite]");
    println!();
    println!("Available suites:");
    println!("  quick     - Quick smoke run across all suites (default)");
    println!("  tree      - Move-tree convergence under random delivery");
    println!("  counters  - PN-counter merge convergence");
    println!("  fs        - Filesystem collision reconciliation");
    println!("  full      - Larger runs of everything");
    println!("  help      - Show this message");
}

fn run_quick() {
    println!("── Quick smoke runs ────────────────────────────────────────");
    stress_test_tree(3, 50, 1).print();
    stress_test_counters(4, 100, 2).print();
    stress_test_fs(10, 3).print();
    println!("\n✓ Quick runs completed");
}

fn run_tree() {
    println!("── Move-tree convergence ───────────────────────────────────");
    stress_test_tree(2, 100, 11).print();
    stress_test_tree(4, 200, 12).print();
    stress_test_tree(8, 200, 13).print();
    println!("\n✓ Move-tree runs completed");
}

fn run_counters() {
    println!("── Counter convergence ─────────────────────────────────────");
    stress_test_counters(2, 500, 21).print();
    stress_test_counters(8, 500, 22).print();
    stress_test_counters(16, 1000, 23).print();
    println!("\n✓ Counter runs completed");
}

fn run_fs() {
    println!("── Filesystem reconciliation ───────────────────────────────");
    stress_test_fs(10, 31).print();
    stress_test_fs(50, 32).print();
    println!("\n✓ Filesystem runs completed");
}

fn run_full() {
    run_tree();
    println!();
    run_counters();
    println!();
    run_fs();
    println!();
    println!("✓ Full suite completed: all replicas converged");
}
