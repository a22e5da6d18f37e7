//! Host-side helper: `cargo run` builds the wasm package into `static/pkg`
//! and serves `static/` on http://127.0.0.1:8000.
//!
//! Pass `--dev` for an unoptimised build; that build also points the
//! teletext weather panel at the bundled `weather.json`.

use std::env;
use std::process::{Command, ExitCode, Stdio};

const PORT: &str = "8000";

fn main() -> ExitCode {
    let dev = env::args().any(|arg| arg == "--dev");
    let profile = if dev { "--dev" } else { "--release" };

    println!("Building wasm package ({profile}) …");
    match Command::new("wasm-pack")
        .args(["build", profile, "--target", "web", "--out-dir", "static/pkg"])
        .status()
    {
        Ok(status) if status.success() => {}
        Ok(_) => {
            eprintln!("wasm-pack finished with errors");
            return ExitCode::FAILURE;
        }
        Err(_) => {
            eprintln!(
                "wasm-pack not found in PATH (https://rustwasm.github.io/wasm-pack/); \
                 serving whatever is already in static/pkg"
            );
        }
    }

    println!("Serving static/ at http://127.0.0.1:{PORT} …");
    let server = Command::new("python3")
        .args(["-m", "http.server", PORT, "--directory", "static"])
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .status();

    match server {
        Ok(status) if status.success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("failed to start http server: {e}");
            ExitCode::FAILURE
        }
    }
}
