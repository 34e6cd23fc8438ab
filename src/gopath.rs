use std::path::{Path, PathBuf};

use log::trace;

use crate::model::package::ImportPath;

/// Picks the GOPATH entry that should receive the destination tree: the one
/// whose existing `src` hierarchy already covers the longest prefix of
/// `destination`. Ties go to the earlier entry, and with no existing
/// structure at all the first entry is chosen.
pub fn choose_gopath(candidates: &[PathBuf], destination: &ImportPath) -> Option<PathBuf> {
    let mut best: Option<(&PathBuf, i32)> = None;
    for candidate in candidates {
        let score = score(candidate, destination);
        trace!("GOPATH entry {} scored {}", candidate.display(), score);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((candidate, score));
        }
    }
    best.map(|(candidate, _)| candidate.clone())
}

fn score(candidate: &Path, destination: &ImportPath) -> i32 {
    if !candidate.is_dir() {
        return -1;
    }
    let mut dir = candidate.join("src");
    if !dir.is_dir() {
        return 0;
    }
    let mut score = 1;
    for element in destination.elements() {
        dir.push(element);
        if !dir.is_dir() {
            break;
        }
        score += 1;
    }
    score
}
