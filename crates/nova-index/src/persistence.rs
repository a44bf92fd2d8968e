//! Binary encoding of a [`SymbolTreeIndex`].
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! magic "NSYT" | version u32 | fingerprint [u8; 32] | node_count u32
//! node*        (pre-order, root first)
//!   name       u32 len + UTF-8
//!   children   u32
//!   symbols    u32, then per symbol:
//!     kind u8 | accessibility u8 | origin u8 | arity u32
//!     parameters  u32 count, each u32 len + UTF-8
//!     parent      u32 (u32::MAX = none)
//!     locations   u32 count, each document u32 | start u32 | end u32
//! ```
//!
//! Handles are implied by position, so a decoded index numbers its symbols
//! exactly like the index that was written.

use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use nova_core::{
    Accessibility, DocumentId, Fingerprint, Location, ProjectId, SymbolKind, TextRange, TextSize,
};

use crate::{
    IndexError, NodeId, SymbolHandle, SymbolInfo, SymbolOrigin, SymbolTreeIndex, SymbolTreeNode,
};

pub const INDEX_MAGIC: [u8; 4] = *b"NSYT";
pub const INDEX_FORMAT_VERSION: u32 = 1;

const NO_PARENT: u32 = u32::MAX;

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl SymbolTreeIndex {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + self.nodes.len() * 32);
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut out);
        out
    }

    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_all(&INDEX_MAGIC)?;
        w.write_u32::<LittleEndian>(INDEX_FORMAT_VERSION)?;
        w.write_all(self.fingerprint.as_bytes())?;
        w.write_u32::<LittleEndian>(self.nodes.len() as u32)?;

        // `nodes` is already stored in pre-order.
        for node in &self.nodes {
            write_str(&mut w, &node.name)?;
            w.write_u32::<LittleEndian>(node.children.len() as u32)?;
            w.write_u32::<LittleEndian>(node.symbols.len() as u32)?;
            for &handle in &node.symbols {
                let info = &self.symbols[handle.idx()];
                w.write_u8(info.kind.tag())?;
                w.write_u8(info.accessibility.tag())?;
                w.write_u8(info.origin.tag())?;
                w.write_u32::<LittleEndian>(info.arity)?;
                w.write_u32::<LittleEndian>(info.parameters.len() as u32)?;
                for param in &info.parameters {
                    write_str(&mut w, param)?;
                }
                w.write_u32::<LittleEndian>(info.parent.map_or(NO_PARENT, SymbolHandle::to_raw))?;
                w.write_u32::<LittleEndian>(info.locations.len() as u32)?;
                for loc in &info.locations {
                    w.write_u32::<LittleEndian>(loc.document.to_raw())?;
                    w.write_u32::<LittleEndian>(loc.range.start().into())?;
                    w.write_u32::<LittleEndian>(loc.range.end().into())?;
                }
            }
        }
        Ok(())
    }

    /// Decodes an index, rejecting anything but a complete, well-formed one.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IndexError> {
        let mut r = Cursor::new(bytes);
        let index = decode(&mut r, bytes.len()).map_err(eof_to_truncated)?;
        if (r.position() as usize) != bytes.len() {
            return Err(IndexError::Corrupt("trailing bytes after index"));
        }
        Ok(index)
    }

    /// Decodes an index from a reader. The reader is consumed to the end.
    pub fn read_from<R: Read>(mut r: R) -> Result<Self, IndexError> {
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes).map_err(|source| IndexError::Io {
            path: PathBuf::new(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }
}

/// Internal decode error: io errors from the cursor mean the input ended early.
enum DecodeError {
    Io(io::Error),
    Index(IndexError),
}

impl From<io::Error> for DecodeError {
    fn from(err: io::Error) -> Self {
        DecodeError::Io(err)
    }
}

impl From<IndexError> for DecodeError {
    fn from(err: IndexError) -> Self {
        DecodeError::Index(err)
    }
}

fn eof_to_truncated(err: DecodeError) -> IndexError {
    match err {
        DecodeError::Io(err) if err.kind() == io::ErrorKind::UnexpectedEof => IndexError::Truncated,
        DecodeError::Io(source) => IndexError::Io {
            path: PathBuf::new(),
            source,
        },
        DecodeError::Index(err) => err,
    }
}

fn corrupt(what: &'static str) -> DecodeError {
    DecodeError::Index(IndexError::Corrupt(what))
}

fn decode(r: &mut Cursor<&[u8]>, total: usize) -> Result<SymbolTreeIndex, DecodeError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != INDEX_MAGIC {
        return Err(IndexError::BadMagic.into());
    }
    let version = r.read_u32::<LittleEndian>()?;
    if version != INDEX_FORMAT_VERSION {
        return Err(IndexError::UnsupportedVersion {
            expected: INDEX_FORMAT_VERSION,
            found: version,
        }
        .into());
    }
    let mut fingerprint = [0u8; 32];
    r.read_exact(&mut fingerprint)?;
    let node_count = r.read_u32::<LittleEndian>()? as usize;
    if node_count == 0 {
        return Err(corrupt("missing root node"));
    }

    // Every node takes at least 12 bytes; cap preallocation by what is left.
    let remaining = total.saturating_sub(r.position() as usize);
    let mut nodes: Vec<SymbolTreeNode> = Vec::with_capacity(node_count.min(remaining / 12));
    let mut symbols: Vec<SymbolInfo> = Vec::new();
    // (node, children still to read)
    let mut open: Vec<(NodeId, u32)> = Vec::new();

    for idx in 0..node_count {
        let id = NodeId::from_raw(idx as u32);
        let parent = if idx == 0 {
            None
        } else {
            while open.last().is_some_and(|&(_, left)| left == 0) {
                open.pop();
            }
            let Some((parent, left)) = open.last_mut() else {
                return Err(corrupt("more nodes than the tree has room for"));
            };
            *left -= 1;
            let parent = *parent;
            nodes[parent.idx()].children.push(id);
            Some(parent)
        };

        let name = read_str(r)?;
        let child_count = r.read_u32::<LittleEndian>()?;
        let symbol_count = r.read_u32::<LittleEndian>()?;
        if idx == 0 && (!name.is_empty() || symbol_count != 0) {
            return Err(corrupt("root node must be empty"));
        }
        if idx != 0 && (name.is_empty() || symbol_count == 0) {
            return Err(corrupt("node without name or symbols"));
        }

        let mut node_symbols = Vec::new();
        for _ in 0..symbol_count {
            let handle = SymbolHandle::from_raw(symbols.len() as u32);
            let info = read_symbol(r, id, parent, &symbols, &nodes)?;
            symbols.push(info);
            node_symbols.push(handle);
        }

        nodes.push(SymbolTreeNode {
            name,
            parent,
            children: Vec::new(),
            symbols: node_symbols,
        });
        open.push((id, child_count));
    }

    if open.iter().any(|&(_, left)| left != 0) {
        return Err(corrupt("node count does not match tree shape"));
    }

    Ok(SymbolTreeIndex::from_parts(
        Fingerprint::from_raw(fingerprint),
        nodes,
        symbols,
    ))
}

fn read_symbol(
    r: &mut Cursor<&[u8]>,
    node: NodeId,
    parent_node: Option<NodeId>,
    symbols: &[SymbolInfo],
    nodes: &[SymbolTreeNode],
) -> Result<SymbolInfo, DecodeError> {
    let kind = SymbolKind::from_tag(r.read_u8()?).ok_or_else(|| corrupt("unknown symbol kind"))?;
    let accessibility =
        Accessibility::from_tag(r.read_u8()?).ok_or_else(|| corrupt("unknown accessibility"))?;
    let origin = SymbolOrigin::from_tag(r.read_u8()?).ok_or_else(|| corrupt("unknown origin"))?;
    let arity = r.read_u32::<LittleEndian>()?;

    let param_count = r.read_u32::<LittleEndian>()?;
    let mut parameters = Vec::new();
    for _ in 0..param_count {
        parameters.push(read_str(r)?);
    }

    let parent = match r.read_u32::<LittleEndian>()? {
        NO_PARENT => None,
        raw => {
            let Some(info) = symbols.get(raw as usize) else {
                return Err(corrupt("parent handle out of range"));
            };
            // The container must live on the parent node.
            if Some(info.node) != parent_node {
                return Err(corrupt("parent symbol is not on the parent node"));
            }
            Some(SymbolHandle::from_raw(raw))
        }
    };
    if parent.is_none() && parent_node != Some(NodeId::ROOT) {
        return Err(corrupt("nested symbol without a parent"));
    }
    debug_assert!(node.idx() == nodes.len());

    let location_count = r.read_u32::<LittleEndian>()?;
    let mut locations = Vec::new();
    for _ in 0..location_count {
        let document = DocumentId::new(r.read_u32::<LittleEndian>()?);
        let start = r.read_u32::<LittleEndian>()?;
        let end = r.read_u32::<LittleEndian>()?;
        if end < start {
            return Err(corrupt("inverted location range"));
        }
        locations.push(Location::new(
            document,
            TextRange::new(TextSize::from(start), TextSize::from(end)),
        ));
    }

    Ok(SymbolInfo {
        kind,
        accessibility,
        origin,
        arity,
        parameters,
        parent,
        node,
        locations,
    })
}

fn write_str<W: Write>(w: &mut W, value: &str) -> io::Result<()> {
    w.write_u32::<LittleEndian>(value.len() as u32)?;
    w.write_all(value.as_bytes())
}

fn read_str(r: &mut Cursor<&[u8]>) -> Result<String, DecodeError> {
    let len = r.read_u32::<LittleEndian>()? as usize;
    let remaining = r.get_ref().len().saturating_sub(r.position() as usize);
    if len > remaining {
        return Err(IndexError::Truncated.into());
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| corrupt("name is not valid UTF-8"))
}

/// File name used for `project`'s index with `fingerprint` inside a persist directory.
pub fn persisted_index_path(dir: &Path, project: ProjectId, fingerprint: Fingerprint) -> PathBuf {
    dir.join(format!("{}-{}.nsyt", project.to_raw(), fingerprint))
}

/// Writes `index` to `path` atomically: readers see either the old file or
/// the complete new one.
pub fn persist_index(path: &Path, index: &SymbolTreeIndex) -> Result<(), IndexError> {
    let io_err = |source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    };
    let parent = path
        .parent()
        .ok_or_else(|| io_err(io::Error::other("destination path has no parent")))?;
    fs::create_dir_all(parent).map_err(io_err)?;

    let (tmp_path, mut file) = open_unique_tmp_file(path, parent).map_err(io_err)?;
    let result = (|| -> io::Result<()> {
        file.write_all(&index.to_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp_path, path)
    })();

    if let Err(err) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(io_err(err));
    }
    Ok(())
}

/// Reads a persisted index.
///
/// Returns `Ok(None)` when no file exists. A file written for a different
/// snapshot fails with [`IndexError::FingerprintMismatch`].
pub fn load_persisted_index(
    path: &Path,
    expected: Fingerprint,
) -> Result<Option<SymbolTreeIndex>, IndexError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(IndexError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let index = SymbolTreeIndex::from_bytes(&bytes)?;
    if index.fingerprint() != expected {
        return Err(IndexError::FingerprintMismatch {
            expected,
            found: index.fingerprint(),
        });
    }
    Ok(Some(index))
}

fn open_unique_tmp_file(dest: &Path, parent: &Path) -> io::Result<(PathBuf, fs::File)> {
    let file_name = dest
        .file_name()
        .ok_or_else(|| io::Error::other("destination path has no file name"))?;
    let pid = std::process::id();

    loop {
        let counter = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut tmp_name = file_name.to_os_string();
        tmp_name.push(format!(".tmp.{pid}.{counter}"));
        let tmp_path = parent.join(tmp_name);

        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)
        {
            Ok(file) => return Ok((tmp_path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err),
        }
    }
}
