use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, Write};
use std::path::PathBuf;

/// A writable file on the storage medium.
pub trait StorageFile: Write + Seek {
    /// Push written data down to the medium.
    fn sync(&mut self) -> io::Result<()>;
}

impl StorageFile for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

/// One directory entry of the storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub is_file: bool,
}

/// Readable file plus its size in bytes.
pub struct Source {
    pub reader: Box<dyn Read>,
    pub size: u64,
}

/// Flat block storage: one root directory, files addressed by name.
///
/// Dropping a handle closes it.
pub trait Storage {
    /// Create or truncate `name` for writing.
    fn create(&self, name: &str) -> io::Result<Box<dyn StorageFile>>;
    /// Open `name` for reading.
    fn open(&self, name: &str) -> io::Result<Source>;
    /// Enumerate the root directory in scan order.
    fn entries(&self) -> io::Result<Box<dyn Iterator<Item = io::Result<Entry>>>>;
}

/// Storage backed by a mounted directory.
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    /// Fails when `root` is not an existing directory, the moral equivalent
    /// of a failed mount.
    pub fn mount(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        let metadata = fs::metadata(&root)?;
        if !metadata.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", root.display()),
            ));
        }
        log::info!("storage mounted at {}", root.display());
        Ok(DirStorage { root })
    }
}

impl Storage for DirStorage {
    fn create(&self, name: &str) -> io::Result<Box<dyn StorageFile>> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(self.root.join(name))?;
        Ok(Box::new(file))
    }

    fn open(&self, name: &str) -> io::Result<Source> {
        let file = File::open(self.root.join(name))?;
        let size = file.metadata()?.len();
        Ok(Source {
            reader: Box::new(file),
            size,
        })
    }

    fn entries(&self) -> io::Result<Box<dyn Iterator<Item = io::Result<Entry>>>> {
        let iter = fs::read_dir(&self.root)?.map(|entry| {
            let entry = entry?;
            Ok(Entry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_file: entry.file_type()?.is_file(),
            })
        });
        Ok(Box::new(iter))
    }
}
