use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use vendorize::{model::package::ImportPath, Vendorize};

const MAIN: &str = r#"package main

import (
	"fmt"

	"example.com/lib/greet"
)

func main() { fmt.Println(greet.Hello()) }
"#;

const GREET: &str = r#"// Package greet says hello.
package greet // import "example.com/lib/greet"

import "example.com/lib/words"

func Hello() string { return words.Hello }
"#;

const WORDS: &str = "package words\n\nconst Hello = \"hello\"\n";

fn write(root: &Path, file: &str, contents: &str) {
    let path = root.join(file);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

fn goroot() -> PathBuf {
    project_root::get_project_root()
        .unwrap()
        .join("resources/goroot")
}

fn workspace() -> tempfile::TempDir {
    let gopath = tempfile::tempdir().unwrap();
    write(gopath.path(), "src/example.com/me/app/main.go", MAIN);
    write(gopath.path(), "src/example.com/lib/greet/greet.go", GREET);
    write(gopath.path(), "src/example.com/lib/words/words.go", WORDS);
    gopath
}

fn vendorize(gopath: &[&Path], dry_run: bool) -> Vendorize {
    gopath
        .iter()
        .fold(Vendorize::builder(), |builder, entry| builder.gopath(*entry))
        .goroot(goroot())
        .dry_run(dry_run)
        .try_build()
        .unwrap()
}

#[test]
fn vendor_into_matching_gopath_entry() {
    let empty = tempfile::tempdir().unwrap();
    let gopath = workspace();

    let report = vendorize(&[empty.path(), gopath.path()], false)
        .vendorize("example.com/me/app", "example.com/me/app/third_party")
        .unwrap();

    assert_eq!(
        report.copied,
        vec![
            ImportPath::new("example.com/lib/words").unwrap(),
            ImportPath::new("example.com/lib/greet").unwrap()
        ]
    );
    let vendored = gopath
        .path()
        .join("src/example.com/me/app/third_party/example.com/lib");
    assert_eq!(
        std::fs::read_to_string(vendored.join("greet/greet.go")).unwrap(),
        GREET
            .replace("// import", "// vendored from")
            .replace(
                "\"example.com/lib/words\"",
                "\"example.com/me/app/third_party/example.com/lib/words\""
            )
    );
    assert_eq!(
        std::fs::read_to_string(vendored.join("words/words.go")).unwrap(),
        WORDS
    );
    assert_eq!(
        std::fs::read_to_string(gopath.path().join("src/example.com/me/app/main.go")).unwrap(),
        MAIN.replace(
            "\"example.com/lib/greet\"",
            "\"example.com/me/app/third_party/example.com/lib/greet\""
        )
    );
    assert_eq!(
        std::fs::read_to_string(gopath.path().join("src/example.com/lib/greet/greet.go")).unwrap(),
        GREET
    );
    assert_eq!(std::fs::read_dir(empty.path()).unwrap().count(), 0);
}

#[test]
fn dry_run_then_rerun() {
    let gopath = workspace();
    let main = gopath.path().join("src/example.com/me/app/main.go");

    let planned = vendorize(&[gopath.path()], true)
        .vendorize("example.com/me/app", "example.com/me/app/third_party")
        .unwrap();
    assert_eq!(std::fs::read_to_string(&main).unwrap(), MAIN);
    assert!(!gopath
        .path()
        .join("src/example.com/me/app/third_party")
        .exists());

    let report = vendorize(&[gopath.path()], false)
        .vendorize("example.com/me/app", "example.com/me/app/third_party")
        .unwrap();
    assert_eq!(planned, report);

    // Everything the root imports now lives below the destination.
    let rerun = vendorize(&[gopath.path()], false)
        .vendorize("example.com/me/app", "example.com/me/app/third_party")
        .unwrap();
    assert!(rerun.copied.is_empty());
    assert!(rerun.actions.is_empty());
}

#[test]
fn ignored_prefix_stays_upstream() {
    let gopath = workspace();

    let report = Vendorize::builder()
        .gopath(gopath.path())
        .goroot(goroot())
        .ignore("example.com/lib/words")
        .try_build()
        .unwrap()
        .vendorize("example.com/me/app", "example.com/me/app/third_party")
        .unwrap();

    assert_eq!(
        report.copied,
        vec![ImportPath::new("example.com/lib/greet").unwrap()]
    );
    let greet = std::fs::read_to_string(
        gopath
            .path()
            .join("src/example.com/me/app/third_party/example.com/lib/greet/greet.go"),
    )
    .unwrap();
    assert!(greet.contains("import \"example.com/lib/words\""), "{greet}");
    assert!(!gopath
        .path()
        .join("src/example.com/me/app/third_party/example.com/lib/words")
        .exists());
}

#[test]
fn refuse_standard_package() {
    let gopath = workspace();
    let err = vendorize(&[gopath.path()], false)
        .vendorize("fmt", "example.com/me/app/third_party")
        .unwrap_err();
    assert!(err.to_string().contains("standard package"), "{err}");
}
