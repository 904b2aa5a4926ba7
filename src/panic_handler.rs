use std::panic;

use log::error;

/// Pretty backtraces in debug builds, a crash report in release builds.
/// Either way the panic also lands in the log file.
pub fn initialize_panic_handler() {
    #[cfg(debug_assertions)]
    better_panic::install();

    #[cfg(not(debug_assertions))]
    human_panic::setup_panic!(human_panic::Metadata::new(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        error!("Panic: {panic_info}");
        log::logger().flush();

        default_hook(panic_info);

        std::process::exit(1);
    }));
}
