//! Persisted cores.
//!
//! A core set is stored as two whitespace-separated integer sequences: the
//! lengths of the cores, and the 0-based soft clause indices of all cores
//! concatenated in the same order.

use std::path::Path;

use anyhow::{Context, Result, bail};

pub fn parse_cores(lengths: &str, indices: &str) -> Result<Vec<Vec<usize>>> {
    let lengths = parse_ints(lengths, "lengths")?;
    let indices = parse_ints(indices, "cores")?;
    let Some(total) = lengths
        .iter()
        .try_fold(0usize, |acc, &len| acc.checked_add(len))
    else {
        bail!("core lengths overflow");
    };
    if total != indices.len() {
        bail!(
            "core lengths add up to {}, but {} indices were given",
            total,
            indices.len()
        );
    }

    let mut cores = Vec::with_capacity(lengths.len());
    let mut rest = indices.as_slice();
    for len in lengths {
        if len > rest.len() {
            bail!("core of length {} runs past the end of the indices", len);
        }
        let (head, tail) = rest.split_at(len);
        cores.push(head.to_vec());
        rest = tail;
    }
    Ok(cores)
}

/// Returns the `(lengths, indices)` texts for `cores`.
pub fn format_cores(cores: &[Vec<usize>]) -> (String, String) {
    let lengths = cores
        .iter()
        .map(|c| c.len().to_string())
        .collect::<Vec<_>>()
        .join(" ");
    let indices = cores
        .iter()
        .flatten()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    (lengths + "\n", indices + "\n")
}

pub fn read_core_files(lengths_path: &Path, cores_path: &Path) -> Result<Vec<Vec<usize>>> {
    let lengths = std::fs::read_to_string(lengths_path)
        .with_context(|| format!("failed to read {}", lengths_path.display()))?;
    let indices = std::fs::read_to_string(cores_path)
        .with_context(|| format!("failed to read {}", cores_path.display()))?;
    parse_cores(&lengths, &indices)
}

pub fn write_core_files(
    lengths_path: &Path,
    cores_path: &Path,
    cores: &[Vec<usize>],
) -> Result<()> {
    let (lengths, indices) = format_cores(cores);
    std::fs::write(lengths_path, lengths)
        .with_context(|| format!("failed to write {}", lengths_path.display()))?;
    std::fs::write(cores_path, indices)
        .with_context(|| format!("failed to write {}", cores_path.display()))?;
    Ok(())
}

fn parse_ints(text: &str, what: &str) -> Result<Vec<usize>> {
    text.split_whitespace()
        .map(|tok| {
            tok.parse::<usize>()
                .with_context(|| format!("invalid integer '{}' in {}", tok, what))
        })
        .collect()
}
