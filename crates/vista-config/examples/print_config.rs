/// Example program to print the loaded configuration
///
/// Run with: cargo run -p vista-config --example print_config

fn main() {
    // Load configuration from vista.toml
    let config = vista_config::VistaConfig::load();

    println!("=== Vista Configuration ===\n");

    println!("Visibility Settings:");
    println!("  Threshold: {}", config.visibility.threshold);
    println!();

    println!("Counter Settings:");
    println!("  Duration (ms): {}", config.counters.duration_ms);
    println!("  Discrete: {}", config.counters.discrete);
    println!();

    println!("Reveal Settings:");
    println!("  Delay (ms): {}", config.reveal.delay_ms);
    println!("  Animation: {}", config.reveal.animation);
    println!();

    println!("Bar Settings:");
    println!("  Transition (ms): {}", config.bars.transition_ms);
    println!("  Timing: {}", config.bars.timing);
    println!();

    println!("Typewriter Settings:");
    println!("  Interval (ms): {}", config.typewriter.interval_ms);
    println!();

    // Try to serialize to TOML for verification
    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
