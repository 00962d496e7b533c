//! Dynamic manifest binaries: shared libraries that describe their plugins
//! at load time instead of through static Turtle.

use std::ffi::{c_char, c_int, c_void};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::ptr;

use harmoniq_rdf::{uri, Value};
use libloading::Library;

use crate::ExtensionError;

/// An acquired dynamic manifest, ready to enumerate its subjects.
/// Dropping it releases the binary.
pub trait ManifestExtension: fmt::Debug {
    /// Write the Turtle description of every subject the binary provides.
    fn write_subjects(&mut self, out: &mut dyn Write) -> Result<(), ExtensionError>;
}

/// Source of [`ManifestExtension`]s for the binaries bundles declare.
pub trait ExtensionProvider: fmt::Debug {
    fn acquire(&self, binary: &Value) -> Result<Box<dyn ManifestExtension>, ExtensionError>;
}

// Layout of `LV2_Feature`; only ever passed as an empty list.
#[allow(dead_code)]
#[repr(C)]
struct Feature {
    uri: *const c_char,
    data: *mut c_void,
}

type Handle = *mut c_void;
type OpenFn = unsafe extern "C" fn(handle: *mut Handle, features: *const *const Feature) -> c_int;
type GetSubjectsFn = unsafe extern "C" fn(handle: Handle, fp: *mut libc::FILE) -> c_int;
type CloseFn = unsafe extern "C" fn(handle: Handle);

const OPEN_SYMBOL: &str = "lv2_dyn_manifest_open";
const GET_SUBJECTS_SYMBOL: &str = "lv2_dyn_manifest_get_subjects";
const CLOSE_SYMBOL: &str = "lv2_dyn_manifest_close";

/// Loads dynamic manifest binaries in-process with `libloading`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicLibraryProvider;

impl ExtensionProvider for DynamicLibraryProvider {
    fn acquire(&self, binary: &Value) -> Result<Box<dyn ManifestExtension>, ExtensionError> {
        let path = binary
            .as_uri()
            .and_then(uri::file_uri_to_path)
            .ok_or_else(|| ExtensionError::NotLocal(binary.to_string()))?;
        Ok(Box::new(DynamicManifest::open(&path)?))
    }
}

struct DynamicManifest {
    library_path: PathBuf,
    handle: Handle,
    get_subjects: GetSubjectsFn,
    close: Option<CloseFn>,
    // Unloaded after `close` has run in `Drop`.
    _library: Library,
}

impl DynamicManifest {
    fn open(path: &Path) -> Result<Self, ExtensionError> {
        if !path.exists() {
            return Err(ExtensionError::MissingBinary(path.to_path_buf()));
        }

        let library = unsafe { Library::new(path) }?;
        let get_subjects = unsafe {
            *library
                .get::<GetSubjectsFn>(b"lv2_dyn_manifest_get_subjects\0")
                .map_err(|_| ExtensionError::MissingEntry {
                    path: path.to_path_buf(),
                    symbol: GET_SUBJECTS_SYMBOL,
                })?
        };
        let open = unsafe { library.get::<OpenFn>(b"lv2_dyn_manifest_open\0").ok().map(|f| *f) };
        let close = unsafe { library.get::<CloseFn>(b"lv2_dyn_manifest_close\0").ok().map(|f| *f) };

        let mut handle: Handle = ptr::null_mut();
        if let Some(open) = open {
            let features: [*const Feature; 1] = [ptr::null()];
            let code = unsafe { open(&mut handle, features.as_ptr()) };
            if code != 0 {
                return Err(ExtensionError::Failed {
                    symbol: OPEN_SYMBOL,
                    code,
                });
            }
        }

        tracing::debug!(path = %path.display(), "opened dynamic manifest");
        Ok(Self {
            library_path: path.to_path_buf(),
            handle,
            get_subjects,
            close,
            _library: library,
        })
    }
}

impl ManifestExtension for DynamicManifest {
    fn write_subjects(&mut self, out: &mut dyn Write) -> Result<(), ExtensionError> {
        let file = TempFile::new()?;
        let code = unsafe { (self.get_subjects)(self.handle, file.0) };
        if code != 0 {
            return Err(ExtensionError::Failed {
                symbol: GET_SUBJECTS_SYMBOL,
                code,
            });
        }
        out.write_all(&file.read_all()?)?;
        Ok(())
    }
}

impl Drop for DynamicManifest {
    fn drop(&mut self) {
        if let Some(close) = self.close {
            unsafe { close(self.handle) };
            tracing::debug!(path = %self.library_path.display(), symbol = CLOSE_SYMBOL, "released dynamic manifest");
        }
    }
}

impl fmt::Debug for DynamicManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicManifest")
            .field("library_path", &self.library_path)
            .finish()
    }
}

/// Anonymous C stream the binary writes into; closed on drop.
struct TempFile(*mut libc::FILE);

impl TempFile {
    fn new() -> io::Result<Self> {
        let file = unsafe { libc::tmpfile() };
        if file.is_null() {
            return Err(io::Error::last_os_error());
        }
        Ok(Self(file))
    }

    fn read_all(&self) -> io::Result<Vec<u8>> {
        let mut contents = Vec::new();
        let mut chunk = [0u8; 4096];
        unsafe { libc::rewind(self.0) };
        loop {
            let read = unsafe { libc::fread(chunk.as_mut_ptr().cast(), 1, chunk.len(), self.0) };
            if read == 0 {
                break;
            }
            contents.extend_from_slice(&chunk[..read]);
        }
        if unsafe { libc::ferror(self.0) } != 0 {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "failed to read dynamic manifest output",
            ));
        }
        Ok(contents)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        unsafe { libc::fclose(self.0) };
    }
}
