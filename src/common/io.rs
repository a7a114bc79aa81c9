use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::ops::Deref;
use std::path::Path;

use memmap2::{Mmap, MmapOptions};

/// Holds input bytes — either a read-only mmap or an owned Vec.
/// Dereferences to `&[u8]` so the replacer sees one type.
pub enum FileData {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Deref for FileData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            FileData::Mmap(m) => m,
            FileData::Owned(v) => v,
        }
    }
}

/// Below 1MB a single read() beats mmap setup and teardown.
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Read as many bytes as possible into buf, retrying on partial reads.
#[inline]
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

/// Read a whole input file. Large regular files are mapped, small ones read
/// with one exact-size read, special files (pipes, /dev/stdin) read to EOF.
pub fn read_file(path: &Path) -> io::Result<FileData> {
    let file = File::open(path)?;
    let metadata = file.metadata()?;
    let len = metadata.len();

    if !metadata.file_type().is_file() {
        let mut buf = Vec::new();
        (&file).read_to_end(&mut buf)?;
        return Ok(FileData::Owned(buf));
    }
    if len == 0 {
        return Ok(FileData::Owned(Vec::new()));
    }

    if len >= MMAP_THRESHOLD {
        // SAFETY: read-only mapping; in-place rewrites go to a new file that is
        // renamed over this one, so the mapped inode is never modified.
        if let Ok(mmap) = unsafe { MmapOptions::new().map(&file) } {
            #[cfg(target_os = "linux")]
            {
                let _ = mmap.advise(memmap2::Advice::Sequential);
            }
            return Ok(FileData::Mmap(mmap));
        }
    }

    let mut buf = vec![0u8; len as usize];
    let n = read_full(&mut &file, &mut buf)?;
    buf.truncate(n);
    Ok(FileData::Owned(buf))
}

/// Read all of stdin.
pub fn read_stdin() -> io::Result<Vec<u8>> {
    const PREALLOC: usize = 64 * 1024;

    let mut buf = Vec::with_capacity(PREALLOC);
    let mut stdin = io::stdin().lock();
    loop {
        match stdin.read_to_end(&mut buf) {
            Ok(_) => return Ok(buf),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Replace the contents of `path` with `data` without ever leaving it
/// half-written: the bytes go to a temporary file in the same directory,
/// which is then renamed over the target. The original permissions are kept.
/// On failure the original file is untouched and the temporary is removed.
pub fn write_file_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let perms = fs::metadata(path).map(|m| m.permissions()).ok();

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    if let Some(perms) = perms {
        tmp.as_file().set_permissions(perms)?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
