use clap::{ArgMatches, Command};

/// Name of the configuration file read from the working directory.
pub const CONFIG_FILE: &str = "config.ini";

pub fn get_matches() -> ArgMatches {
    command().get_matches()
}

fn command() -> Command {
    Command::new("mosaipic")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a photomosaic from a main image and a directory of small images.")
        .after_help(format!(
            "All settings are read from `{CONFIG_FILE}` in the current directory."
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_no_arguments() {
        assert!(command().try_get_matches_from(["mosaipic"]).is_ok());
    }

    #[test]
    fn rejects_positional_arguments() {
        assert!(command()
            .try_get_matches_from(["mosaipic", "main.jpg"])
            .is_err());
    }
}
