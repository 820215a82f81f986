use std::env;

fn main() {
    // Timer defaults (optional)
    // These are baked into the crate as compile-time defaults for TimerConfig

    // Event pool capacity used when a Scheduler does not name one
    if let Ok(size) = env::var("PICO_TICK_EVENT_LIST_SIZE") {
        println!("cargo:rustc-env=PICO_TICK_EVENT_LIST_SIZE={}", size);
        println!(
            "cargo:warning=Using PICO_TICK_EVENT_LIST_SIZE from environment: {}",
            size
        );
    } else {
        println!("cargo:rustc-env=PICO_TICK_EVENT_LIST_SIZE=10");
    }

    // Upper bound between two fallback interrupts, in microseconds
    if let Ok(interval) = env::var("PICO_TICK_FALLBACK_INTERVAL_US") {
        println!("cargo:rustc-env=PICO_TICK_FALLBACK_INTERVAL_US={}", interval);
        println!(
            "cargo:warning=Using PICO_TICK_FALLBACK_INTERVAL_US from environment: {}",
            interval
        );
    } else {
        println!("cargo:rustc-env=PICO_TICK_FALLBACK_INTERVAL_US=10000000");
    }

    // Rerun if environment variables change
    println!("cargo:rerun-if-env-changed=PICO_TICK_EVENT_LIST_SIZE");
    println!("cargo:rerun-if-env-changed=PICO_TICK_FALLBACK_INTERVAL_US");
}
