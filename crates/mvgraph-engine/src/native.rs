//! FFI bindings to the native graph engine library.
//!
//! Every entry point returns `1` on success. String results are written into
//! caller-provided buffers of [`RETURN_BUFFER_LEN`] bytes.

use crate::engine::{CallFailed, CallResult, GraphEngine};
use crate::error::{Error, Result};
use crate::types::{FilterId, GraphState, PlaybackMode};
use std::cell::RefCell;
use std::ffi::{c_char, c_int, CStr, CString};
use std::path::Path;

/// Size of every string buffer handed to the engine.
pub const RETURN_BUFFER_LEN: usize = 8 * 1024;

const SUCCESS: c_int = 1;

#[link(name = "MvxGraphCore")]
extern "C" {
    fn Init(plugins_path: *const c_char, memory_pool: c_int) -> c_int;
    fn GetLastGraphError(buffer_len: c_int, buffer: *mut c_char) -> c_int;
    fn GetGraphState(state: *mut c_int) -> c_int;
    fn CreateGraph() -> c_int;
    fn CreateFilterFromGuid(guid: *const c_char, name: *const c_char, id: *mut c_int) -> c_int;
    fn CreateFilterFromName(name: *const c_char, id: *mut c_int) -> c_int;
    fn DestroyFilter(id: c_int) -> c_int;
    fn SetFilterParameter(id: c_int, name: *const c_char, value: *const c_char) -> c_int;
    fn GetFilterParameter(
        id: c_int,
        name: *const c_char,
        buffer_len: c_int,
        buffer: *mut c_char,
    ) -> c_int;
    fn GetFilterParameters(id: c_int, buffer_len: c_int, buffer: *mut c_char) -> c_int;
    fn AddFilterToGraph(id: c_int) -> c_int;
    fn BuildGraph() -> c_int;
    fn PlayGraph(mode: c_int) -> c_int;
    fn StopGraph() -> c_int;
    fn PauseGraph() -> c_int;
    fn ResumeGraph() -> c_int;
    fn DestroyGraph() -> c_int;
    fn GetAvailableFilters() -> c_int;
    fn GetFilterGuidByName(name: *const c_char, buffer_len: c_int, buffer: *mut c_char) -> c_int;
    fn GetFilterNameByGuid(guid: *const c_char, buffer_len: c_int, buffer: *mut c_char) -> c_int;
    fn GraphSourceInfo(buffer_len: c_int, buffer: *mut c_char) -> c_int;
}

/// Diagnostic for a call that failed on our side of the boundary (bad
/// strings, id overflow) rather than inside the engine.
///
/// Cleared whenever a call reaches the engine, so an engine failure always
/// reports the engine's own message.
#[derive(Debug, Default)]
struct LocalError(RefCell<Option<String>>);

impl LocalError {
    fn fail<T>(&self, message: String) -> CallResult<T> {
        self.0.replace(Some(message));
        Err(CallFailed)
    }

    /// Interpret an engine return code.
    fn check(&self, rc: c_int) -> CallResult<()> {
        self.0.replace(None);
        if rc == SUCCESS {
            Ok(())
        } else {
            Err(CallFailed)
        }
    }

    fn message(&self) -> Option<String> {
        self.0.borrow().clone()
    }
}

/// [`GraphEngine`] backed by the native library.
///
/// The library keeps one process-wide graph, so only a single instance should
/// exist at a time.
#[derive(Debug)]
pub struct NativeEngine {
    local_error: LocalError,
}

impl NativeEngine {
    /// Initialise the library with its plugin directory and memory pool size.
    pub fn init(plugins_path: &Path, memory_pool: u32) -> Result<Self> {
        let path = plugins_path.to_string_lossy();
        let c_path = CString::new(path.as_bytes())
            .map_err(|_| Error::Init(format!("plugin path contains NUL: {path}")))?;
        let pool = c_int::try_from(memory_pool)
            .map_err(|_| Error::Init(format!("memory pool out of range: {memory_pool}")))?;

        let engine = Self {
            local_error: LocalError::default(),
        };

        // SAFETY: c_path outlives the call.
        let rc = unsafe { Init(c_path.as_ptr(), pool) };
        if rc != SUCCESS {
            return Err(Error::Init(engine.last_error()));
        }
        tracing::info!(plugins = %plugins_path.display(), memory_pool, "native engine initialised");
        Ok(engine)
    }

    fn check(&self, rc: c_int) -> CallResult<()> {
        self.local_error.check(rc)
    }

    fn local_fail<T>(&self, message: String) -> CallResult<T> {
        self.local_error.fail(message)
    }

    fn c_string(&self, value: &str) -> CallResult<CString> {
        match CString::new(value) {
            Ok(s) => Ok(s),
            Err(_) => self.local_fail(format!("argument contains NUL byte: {value:?}")),
        }
    }

    fn raw_id(&self, id: FilterId) -> CallResult<c_int> {
        match c_int::try_from(id.raw()) {
            Ok(raw) => Ok(raw),
            Err(_) => self.local_fail(format!("filter id out of range: {id}")),
        }
    }

    /// Run `f` with a zeroed return buffer and decode what the engine wrote.
    fn read_buffer(&self, f: impl FnOnce(c_int, *mut c_char) -> c_int) -> CallResult<String> {
        let mut buffer = vec![0u8; RETURN_BUFFER_LEN];
        let rc = f(RETURN_BUFFER_LEN as c_int, buffer.as_mut_ptr().cast());
        self.check(rc)?;
        Ok(decode_buffer(&buffer))
    }
}

fn decode_buffer(buffer: &[u8]) -> String {
    match CStr::from_bytes_until_nul(buffer) {
        Ok(s) => s.to_string_lossy().into_owned(),
        Err(_) => String::from_utf8_lossy(buffer).into_owned(),
    }
}

impl GraphEngine for NativeEngine {
    fn create_graph(&mut self) -> CallResult<()> {
        // SAFETY: no arguments.
        self.check(unsafe { CreateGraph() })
    }

    fn create_filter_by_name(&mut self, filter_type: &str) -> CallResult<FilterId> {
        let name = self.c_string(filter_type)?;
        let mut id: c_int = 0;
        // SAFETY: name and id outlive the call.
        self.check(unsafe { CreateFilterFromName(name.as_ptr(), &mut id) })?;
        Ok(FilterId::new(i64::from(id)))
    }

    fn create_filter_by_guid(&mut self, guid: &str, name: &str) -> CallResult<FilterId> {
        let guid = self.c_string(guid)?;
        let name = self.c_string(name)?;
        let mut id: c_int = 0;
        // SAFETY: all pointers outlive the call.
        self.check(unsafe { CreateFilterFromGuid(guid.as_ptr(), name.as_ptr(), &mut id) })?;
        Ok(FilterId::new(i64::from(id)))
    }

    fn destroy_filter(&mut self, id: FilterId) -> CallResult<()> {
        let raw = self.raw_id(id)?;
        // SAFETY: plain integer argument.
        self.check(unsafe { DestroyFilter(raw) })
    }

    fn add_filter_to_graph(&mut self, id: FilterId) -> CallResult<()> {
        let raw = self.raw_id(id)?;
        // SAFETY: plain integer argument.
        self.check(unsafe { AddFilterToGraph(raw) })
    }

    fn build_graph(&mut self) -> CallResult<()> {
        // SAFETY: no arguments.
        self.check(unsafe { BuildGraph() })
    }

    fn play(&mut self, mode: PlaybackMode) -> CallResult<()> {
        // SAFETY: plain integer argument.
        self.check(unsafe { PlayGraph(mode.code()) })
    }

    fn pause(&mut self) -> CallResult<()> {
        // SAFETY: no arguments.
        self.check(unsafe { PauseGraph() })
    }

    fn resume(&mut self) -> CallResult<()> {
        // SAFETY: no arguments.
        self.check(unsafe { ResumeGraph() })
    }

    fn stop(&mut self) -> CallResult<()> {
        // SAFETY: no arguments.
        self.check(unsafe { StopGraph() })
    }

    fn destroy_graph(&mut self) -> CallResult<()> {
        // SAFETY: no arguments.
        self.check(unsafe { DestroyGraph() })
    }

    fn state(&self) -> CallResult<GraphState> {
        let mut code: c_int = 0;
        // SAFETY: code outlives the call.
        self.check(unsafe { GetGraphState(&mut code) })?;
        match GraphState::from_code(code) {
            Ok(state) => Ok(state),
            Err(e) => self.local_fail(e.to_string()),
        }
    }

    fn get_param(&self, id: FilterId, name: &str) -> CallResult<String> {
        let raw = self.raw_id(id)?;
        let name = self.c_string(name)?;
        // SAFETY: the buffer pointer is valid for `len` bytes during the call.
        self.read_buffer(|len, buf| unsafe { GetFilterParameter(raw, name.as_ptr(), len, buf) })
    }

    fn get_params(&self, id: FilterId) -> CallResult<String> {
        let raw = self.raw_id(id)?;
        // SAFETY: the buffer pointer is valid for `len` bytes during the call.
        self.read_buffer(|len, buf| unsafe { GetFilterParameters(raw, len, buf) })
    }

    fn set_param(&mut self, id: FilterId, name: &str, value: &str) -> CallResult<()> {
        let raw = self.raw_id(id)?;
        let name = self.c_string(name)?;
        let value = self.c_string(value)?;
        // SAFETY: all pointers outlive the call.
        self.check(unsafe { SetFilterParameter(raw, name.as_ptr(), value.as_ptr()) })
    }

    fn list_available_filters(&self) -> CallResult<()> {
        // SAFETY: no arguments.
        self.check(unsafe { GetAvailableFilters() })
    }

    fn filter_guid_by_name(&self, filter_type: &str) -> CallResult<String> {
        let name = self.c_string(filter_type)?;
        // SAFETY: the buffer pointer is valid for `len` bytes during the call.
        self.read_buffer(|len, buf| unsafe { GetFilterGuidByName(name.as_ptr(), len, buf) })
    }

    fn filter_name_by_guid(&self, guid: &str) -> CallResult<String> {
        let guid = self.c_string(guid)?;
        // SAFETY: the buffer pointer is valid for `len` bytes during the call.
        self.read_buffer(|len, buf| unsafe { GetFilterNameByGuid(guid.as_ptr(), len, buf) })
    }

    fn source_info(&self) -> CallResult<String> {
        // SAFETY: the buffer pointer is valid for `len` bytes during the call.
        self.read_buffer(|len, buf| unsafe { GraphSourceInfo(len, buf) })
    }

    fn last_error(&self) -> String {
        if let Some(local) = self.local_error.message() {
            return local;
        }
        let mut buffer = vec![0u8; RETURN_BUFFER_LEN];
        // SAFETY: the buffer pointer is valid for its full length during the call.
        let rc = unsafe { GetLastGraphError(RETURN_BUFFER_LEN as c_int, buffer.as_mut_ptr().cast()) };
        if rc != SUCCESS {
            return "engine did not report an error message".to_string();
        }
        decode_buffer(&buffer)
    }
}
