//! Term index and link index files
//!
//! Term file: `[next_offset:8]` then repeated
//! `[term_len:8][term bytes][count:8][count x offset:8]`.
//!
//! Link file: repeated `[offset:8][count:8][count x link hash:8]`, one record
//! per offset that has owners. The identifier -> offset direction is not
//! stored; loading replays every pair through `LinkIndex::set_reference`.
//!
//! Each file is written to a `.tmp` sibling and renamed into place.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::error::{Result, StoreError};
use crate::index::{LinkIndex, TermIndex};
use crate::persistence::codec::{read_bytes, read_u64, try_read_u64, write_bytes, write_u64};
use crate::types::ContentOffset;

/// Indexes restored from disk
#[derive(Debug, Default)]
pub struct LoadedIndexes {
    pub next_offset: ContentOffset,
    pub terms: TermIndex,
    pub links: LinkIndex,
}

/// Location of the two index files
#[derive(Clone, Debug)]
pub struct IndexFiles {
    term_offsets_path: PathBuf,
    link_hashes_path: PathBuf,
}

impl IndexFiles {
    pub fn new(term_offsets_path: PathBuf, link_hashes_path: PathBuf) -> Self {
        Self {
            term_offsets_path,
            link_hashes_path,
        }
    }

    /// At least one of the files is present
    pub fn any_exist(&self) -> bool {
        self.term_offsets_path.exists() || self.link_hashes_path.exists()
    }

    /// Write both indexes; the first failure aborts the save.
    pub fn save(
        &self,
        next_offset: ContentOffset,
        terms: &TermIndex,
        links: &LinkIndex,
    ) -> Result<()> {
        write_atomically(&self.term_offsets_path, |w| {
            write_term_index(w, next_offset, terms)
        })
        .inspect_err(|e| error!(error = %e, "failed to write term index"))?;
        info!(terms = terms.len(), next_offset, "term index written");

        write_atomically(&self.link_hashes_path, |w| write_link_index(w, links))
            .inspect_err(|e| error!(error = %e, "failed to write link index"))?;
        info!(offsets = links.offset_count(), "link index written");

        Ok(())
    }

    /// Read both indexes; any missing file or truncated record is fatal.
    pub fn load(&self) -> Result<LoadedIndexes> {
        let mut reader = open_reader(&self.term_offsets_path)?;
        let (next_offset, terms) = read_term_index(&mut reader)
            .inspect_err(|e| error!(error = %e, "failed to read term index"))?;
        info!(terms = terms.len(), next_offset, "term index read");

        let mut reader = open_reader(&self.link_hashes_path)?;
        let links = read_link_index(&mut reader)
            .inspect_err(|e| error!(error = %e, "failed to read link index"))?;
        info!(offsets = links.offset_count(), links = links.linked_count(), "link index read");

        Ok(LoadedIndexes {
            next_offset,
            terms,
            links,
        })
    }
}

fn open_reader(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| StoreError::read(format!("open {}", path.display()), e))
}

fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let tmp = path.with_extension(match path.extension() {
        Some(ext) => format!("{}.tmp", ext.to_string_lossy()),
        None => "tmp".to_string(),
    });

    let file = File::create(&tmp)
        .map_err(|e| StoreError::write(format!("create {}", tmp.display()), e))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer
        .flush()
        .map_err(|e| StoreError::write(format!("flush {}", tmp.display()), e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| StoreError::write(format!("sync {}", tmp.display()), e))?;
    drop(writer);

    fs::rename(&tmp, path)
        .map_err(|e| StoreError::write(format!("rename to {}", path.display()), e))
}

pub(crate) fn write_term_index<W: Write>(
    writer: &mut W,
    next_offset: ContentOffset,
    terms: &TermIndex,
) -> Result<()> {
    write_u64(writer, next_offset, "next string offset")?;
    for (term, offsets) in terms.entries() {
        write_u64(writer, term.len() as u64, "term size")?;
        write_bytes(writer, &term, "term")?;
        write_u64(writer, offsets.len() as u64, "term offsets count")?;
        for &offset in offsets {
            write_u64(writer, offset, "string offset")?;
        }
    }
    Ok(())
}

pub(crate) fn read_term_index<R: std::io::Read>(
    reader: &mut R,
) -> Result<(ContentOffset, TermIndex)> {
    let next_offset = read_u64(reader, "next string offset")?;
    let mut terms = TermIndex::new();

    while let Some(term_len) = try_read_u64(reader, "term size")? {
        let term = read_bytes(reader, term_len, "term")?;
        let count = read_u64(reader, "term offsets count")?;
        for _ in 0..count {
            let offset = read_u64(reader, "string offset")?;
            terms.append(&term, offset);
        }
    }

    Ok((next_offset, terms))
}

pub(crate) fn write_link_index<W: Write>(writer: &mut W, links: &LinkIndex) -> Result<()> {
    for (offset, owners) in links.entries() {
        write_u64(writer, offset, "string offset")?;
        write_u64(writer, owners.len() as u64, "link hashes count")?;
        for &link in owners {
            write_u64(writer, link, "link hash")?;
        }
    }
    Ok(())
}

pub(crate) fn read_link_index<R: std::io::Read>(reader: &mut R) -> Result<LinkIndex> {
    let mut links = LinkIndex::new();

    while let Some(offset) = try_read_u64(reader, "string offset")? {
        let count = read_u64(reader, "link hashes count")?;
        for _ in 0..count {
            let link = read_u64(reader, "link hash")?;
            links.set_reference(link, offset);
        }
    }

    Ok(links)
}
