//! consolectl - settings console front end

use console_cli::{command, init_tracing, load_config, Console};
use std::path::PathBuf;

#[tokio::main]
async fn main() {
    let matches = command().get_matches();

    let result = async {
        let config = load_config(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
        init_tracing(&config.logging)?;
        let console = Console::connect(config)?;
        console.run(&matches).await
    }
    .await;

    match result {
        Ok(output) => print!("{}", with_newline(output)),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn with_newline(mut output: String) -> String {
    if !output.ends_with('\n') {
        output.push('\n');
    }
    output
}
