// tests/chain.rs

//! End-to-end CHAIN runs against temporary data roots.

mod common;

use centaur::action::{self, ActionKind};
use centaur::{ErrorKind, UploadFailureKind};
use common::Workspace;
use std::fs;

#[test]
fn test_failed_build_stops_chain() {
    let ws = Workspace::new();
    let log = ws.root().join("uploads.log");
    let uploader = ws.fake_uploader(&log);
    let pkg = ws.add_package(
        "hello",
        &format!(
            "[builder]\ntype = \"chroot\"\ncommand = \"false\"\n\n\
             [uploader]\ntype = \"remote\"\ncommand = \"{uploader}\"\nrepo = \"jane/hello\"\n"
        ),
    );

    let report = action::run_chain(&pkg);
    assert!(!report.succeeded());
    assert_eq!(
        report.executed(),
        vec![ActionKind::Get, ActionKind::Construct, ActionKind::Build]
    );

    let failure = report.failure().unwrap();
    assert_eq!(failure.reason, Some(ErrorKind::BuildFailure));

    // earlier steps keep their effects
    let doc = pkg.load_description().unwrap();
    assert_eq!(doc.version_value().unwrap(), "0");
    assert!(!log.exists());
    assert!(!ws.packages("hello").exists());

    let result = report.into_result();
    assert_eq!(result.action, ActionKind::Chain);
    assert!(!result.succeeded);
    assert_eq!(result.reason, Some(ErrorKind::BuildFailure));
}

#[test]
fn test_local_source_full_chain() {
    let ws = Workspace::new();
    let upstream = ws.root().join("upstream");
    fs::create_dir_all(&upstream).unwrap();
    fs::write(upstream.join("hello.c"), "int main(void) { return 0; }\n").unwrap();

    let mock = ws.fake_mock();
    let log = ws.root().join("uploads.log");
    let uploader = ws.fake_uploader(&log);
    let pkg = ws.add_package(
        "hello",
        &format!(
            "[source]\ntype = \"local\"\norig = \"{}\"\n\n\
             [builder]\ntype = \"chroot\"\ncommand = \"{mock}\"\n\n\
             [uploader]\ntype = \"remote\"\ncommand = \"{uploader}\"\nrepo = \"jane/hello\"\n\
             dists = [\"fedora-rawhide-x86_64\"]\nwait = false\n",
            upstream.display()
        ),
    );

    let report = action::run_chain(&pkg);
    assert!(report.succeeded(), "{:?}", report);
    assert_eq!(
        report.executed(),
        vec![
            ActionKind::Get,
            ActionKind::Construct,
            ActionKind::Build,
            ActionKind::Export,
            ActionKind::Upload
        ]
    );

    // same upstream version, so only the release moves
    let doc = pkg.load_description().unwrap();
    assert_eq!(doc.version_value().unwrap(), "1.0");
    assert_eq!(doc.release_value().unwrap(), "2%{?dist}");
    assert!(doc.content().contains("- 1.0-2\n- Rebuild"));

    assert!(pkg.description_dir().join("hello-1.0.tar.gz").exists());
    assert!(ws.packages("hello").join("hello-1.0-1.src.rpm").exists());
    assert!(ws.packages("hello").join("hello-1.0-1.x86_64.rpm").exists());

    let uploads = fs::read_to_string(&log).unwrap();
    assert!(uploads.starts_with("build jane/hello --chroot fedora-rawhide-x86_64 --nowait "));
    assert!(uploads.trim_end().ends_with("hello-1.0-1.src.rpm"));

    // a second run updates instead of fetching
    let again = action::run_chain(&pkg);
    assert!(again.succeeded(), "{:?}", again);
    assert_eq!(again.executed().first(), Some(&ActionKind::Update));
    let doc = pkg.load_description().unwrap();
    assert_eq!(doc.release_value().unwrap(), "3%{?dist}");
}

#[test]
fn test_get_twice_is_not_a_failure() {
    let ws = Workspace::new();
    let pkg = ws.add_package("hello", "");

    assert_eq!(action::run(ActionKind::Get, &pkg).reason, None);

    let second = action::run(ActionKind::Get, &pkg);
    assert!(second.succeeded);
    assert_eq!(second.reason, Some(ErrorKind::AlreadyExists));
}

#[test]
fn test_unknown_package_file_is_configuration_error() {
    let ws = Workspace::new();
    let err = centaur::Package::load(&ws.config, "ghost").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigurationError);
}

#[test]
fn test_git_chain_tracks_new_commits() {
    if !common::have_git() {
        eprintln!("Skipping git chain test: git not installed");
        return;
    }

    let ws = Workspace::new();
    let upstream = common::git_upstream(ws.root());
    let first = common::git(&upstream, &["rev-parse", "HEAD"]);
    let pkg = ws.add_package(
        "hello",
        &format!(
            "[package]\nversion = \"1.3\"\n\n[source]\ntype = \"git\"\norig = \"{}\"\n",
            upstream.display()
        ),
    );

    let report = action::run_chain(&pkg);
    assert!(report.succeeded(), "{:?}", report);

    let doc = pkg.load_description().unwrap();
    assert_eq!(doc.version_value().unwrap(), format!("1.3+{}", &first[..7]));
    assert_eq!(doc.release_value().unwrap(), "1%{?dist}");
    assert!(pkg
        .description_dir()
        .join(format!("hello-1.3+{}.tar.gz", &first[..7]))
        .exists());

    fs::write(upstream.join("README"), "hello again").unwrap();
    common::git(&upstream, &["commit", "--quiet", "-am", "second"]);
    let second = common::git(&upstream, &["rev-parse", "HEAD"]);

    let report = action::run_chain(&pkg);
    assert!(report.succeeded(), "{:?}", report);
    assert_eq!(report.executed().first(), Some(&ActionKind::Update));

    let doc = pkg.load_description().unwrap();
    assert_eq!(doc.version_value().unwrap(), format!("1.3+{}", &second[..7]));
    assert_eq!(doc.release_value().unwrap(), "1%{?dist}");
}

/// Chain with `keep = false`; BUILD must still find the staged archive
fn assert_chain_without_keep(ws: &Workspace, source: &str, archive: &str) {
    let mock = ws.fake_mock_needing(archive);
    let pkg = ws.add_package(
        "hello",
        &format!("{source}keep = false\n\n[builder]\ntype = \"chroot\"\ncommand = \"{mock}\"\n"),
    );

    let report = action::run_chain(&pkg);
    assert!(report.succeeded(), "{:?}", report);
    assert_eq!(
        report.executed(),
        vec![
            ActionKind::Get,
            ActionKind::Construct,
            ActionKind::Build,
            ActionKind::Export
        ]
    );

    assert!(!pkg.source.working_copy_exists());
    assert!(pkg.description_dir().join(archive).exists());
    assert!(ws.packages("hello").join("hello-1.0-1.src.rpm").exists());
}

#[test]
fn test_local_chain_without_keep() {
    let ws = Workspace::new();
    let upstream = ws.root().join("upstream");
    fs::create_dir_all(&upstream).unwrap();
    fs::write(upstream.join("hello.c"), "int main(void) { return 0; }\n").unwrap();

    let source = format!(
        "[source]\ntype = \"local\"\norig = \"{}\"\n",
        upstream.display()
    );
    assert_chain_without_keep(&ws, &source, "hello-1.0.tar.gz");
}

#[test]
fn test_url_chain_without_keep() {
    let ws = Workspace::new();
    let mirror = ws.root().join("mirror");
    fs::create_dir_all(&mirror).unwrap();
    fs::write(mirror.join("libhello-0.3.tar.xz"), b"not really xz").unwrap();

    let source = format!(
        "[source]\ntype = \"url\"\norig = \"file://{}/libhello-0.3.tar.xz\"\n",
        mirror.display()
    );
    assert_chain_without_keep(&ws, &source, "hello-0.3.tar.xz");
}

#[test]
fn test_git_chain_without_keep() {
    if !common::have_git() {
        eprintln!("Skipping git chain test: git not installed");
        return;
    }

    let ws = Workspace::new();
    let upstream = common::git_upstream(ws.root());
    let head = common::git(&upstream, &["rev-parse", "HEAD"]);

    let source = format!(
        "[package]\nversion = \"1.3\"\n\n[source]\ntype = \"git\"\norig = \"{}\"\n",
        upstream.display()
    );
    assert_chain_without_keep(&ws, &source, &format!("hello-1.3+{}.tar.gz", &head[..7]));
}

#[test]
fn test_bzr_chain_without_keep() {
    if !common::have_bzr() {
        eprintln!("Skipping bzr chain test: bzr not installed");
        return;
    }

    let ws = Workspace::new();
    let upstream = common::bzr_upstream(ws.root());

    let source = format!(
        "[package]\nversion = \"1.3\"\n\n[source]\ntype = \"bzr\"\norig = \"{}\"\n",
        upstream.display()
    );
    assert_chain_without_keep(&ws, &source, "hello-1.3+r1.tar.gz");
}

#[test]
fn test_missing_build_tool_fails_chain() {
    let ws = Workspace::new();
    let pkg = ws.add_package(
        "hello",
        "[builder]\ntype = \"chroot\"\ncommand = \"centaur-no-such-mock\"\n",
    );

    let report = action::run_chain(&pkg);
    assert!(!report.succeeded());
    assert_eq!(
        report.executed(),
        vec![ActionKind::Get, ActionKind::Construct, ActionKind::Build]
    );
    assert_eq!(report.failure().unwrap().reason, Some(ErrorKind::BuildFailure));
}

#[test]
fn test_missing_upload_client_fails_chain() {
    let ws = Workspace::new();
    let mock = ws.fake_mock();
    let pkg = ws.add_package(
        "hello",
        &format!(
            "[builder]\ntype = \"chroot\"\ncommand = \"{mock}\"\n\n\
             [uploader]\ntype = \"remote\"\ncommand = \"centaur-no-such-copr\"\nrepo = \"jane/hello\"\n"
        ),
    );

    let report = action::run_chain(&pkg);
    assert!(!report.succeeded());
    assert_eq!(report.executed().last(), Some(&ActionKind::Upload));
    assert_eq!(
        report.failure().unwrap().reason,
        Some(ErrorKind::UploadFailure(UploadFailureKind::Network))
    );
}

#[test]
fn test_upstream_named_results() {
    let ws = Workspace::new();
    let upstream = ws.root().join("upstream");
    fs::create_dir_all(&upstream).unwrap();
    fs::write(upstream.join("hello.c"), "int main(void) { return 0; }\n").unwrap();

    let mock = ws.fake_mock();
    let pkg = ws.add_package(
        "results",
        &format!(
            "[source]\ntype = \"local\"\norig = \"{}\"\n\n\
             [builder]\ntype = \"chroot\"\ncommand = \"{mock}\"\n",
            upstream.display()
        ),
    );

    let report = action::run_chain(&pkg);
    assert!(report.succeeded(), "{:?}", report);

    // the build wipes its own output directory, never the working copy
    assert!(pkg.source.working_copy().join("hello.c").exists());
    assert!(pkg.description_dir().join("results-1.0.tar.gz").exists());

    let again = action::run_chain(&pkg);
    assert!(again.succeeded(), "{:?}", again);
    assert_eq!(again.executed().first(), Some(&ActionKind::Update));
}
