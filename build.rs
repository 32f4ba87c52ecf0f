// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: package names
fn packages_arg() -> Arg {
    Arg::new("packages")
        .num_args(0..)
        .value_name("PACKAGE")
        .help("Package names (configuration file stems)")
}

/// Common argument: every configured package
fn all_arg() -> Arg {
    Arg::new("all")
        .short('a')
        .long("all")
        .action(ArgAction::SetTrue)
        .help("Run against every configured package")
}

fn action(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(packages_arg())
        .arg(all_arg())
}

fn build_cli() -> Command {
    Command::new("centaur")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Centaur Contributors")
        .about("Packaging automation: fetch, bump, build and upload")
        .arg(
            Arg::new("basedir")
                .short('b')
                .long("basedir")
                .value_name("DIR")
                .help("Data root holding configs, sources, specs and packages"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Show debug output"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Only show warnings and errors"),
        )
        .subcommand(action("get", "Fetch upstream sources"))
        .subcommand(action("update", "Update existing working copies"))
        .subcommand(action("refresh", "Discard working copies and fetch them again"))
        .subcommand(action(
            "prepare",
            "Export source archives and stage them next to the description",
        ))
        .subcommand(action(
            "construct",
            "Bump version and release in the package description",
        ))
        .subcommand(action("build", "Build packages with the configured builder"))
        .subcommand(action("export", "Copy built packages to the package directory"))
        .subcommand(action(
            "upload",
            "Submit source packages to the remote build service",
        ))
        .subcommand(action("clean", "Remove working copies and exported archives"))
        .subcommand(action("status", "Show package status"))
        .subcommand(action("verify", "Check package configuration and required tools"))
        .subcommand(action(
            "chain",
            "Run get/update, construct, build, export and upload in order",
        ))
        .subcommand(Command::new("list").about("List configured packages"))
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(Arg::new("shell").required(true).help("Shell to generate completions for")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("centaur.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
