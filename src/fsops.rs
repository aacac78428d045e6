//! File transfer helpers shared by the still export and motion copy

use crate::config::FileOperation;
use crate::error::Result;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Copy or hard-link `source` to `dest`, creating parent directories
///
/// An existing `dest` is replaced. The source modification time is carried
/// over to copies.
pub fn transfer_file(source: &Path, dest: &Path, operation: FileOperation) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    match operation {
        FileOperation::Copy => {
            copy_file(source, dest)?;

            if let Ok(metadata) = fs::metadata(source)
                && let Ok(mtime) = metadata.modified()
            {
                let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(mtime));
            }
        }
        FileOperation::Hardlink => {
            if dest.exists() {
                fs::remove_file(dest)?;
            }
            fs::hard_link(source, dest)?;
        }
    }

    Ok(())
}

/// Hidden sibling path used while rewriting `path`, e.g. `.001_x.mirror-tmp.jpg`
///
/// The original extension stays last. The name is deterministic, so two runs
/// against one directory would collide.
pub fn temp_sibling(path: &Path, tag: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, ext) = match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name.as_str(), ""),
    };
    path.with_file_name(format!(".{}.{}{}", stem, tag, ext))
}

/// Copy file with buffered I/O
fn copy_file(source: &Path, dest: &Path) -> Result<()> {
    let src_file = File::open(source)?;
    let dest_file = File::create(dest)?;

    let mut reader = BufReader::with_capacity(256 * 1024, src_file);
    let mut writer = BufWriter::with_capacity(256 * 1024, dest_file);

    let mut buffer = vec![0u8; 256 * 1024];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        writer.write_all(&buffer[..bytes_read])?;
    }

    writer.flush()?;
    Ok(())
}
