//! Per-function validators and executors, grouped by the address space they
//! touch. Every registry row (see `crate::registry`) is built out of the
//! `fn` items in these submodules.

pub mod coils;
pub mod diagnostics;
pub mod misc;
pub mod registers;

use crate::adu::Adu;
use crate::device::Device;
use crate::error::ExceptionCode;
use crate::runtime::Runtime;

/// `check_addr` and `check_data` are pure predicates: the protocol gives no
/// room for a richer verdict than "this step passed or it didn't".
pub type CheckFn = fn(&Adu, &Device) -> bool;

/// Executors mutate device state and, on success, may replace `adu.payload`
/// with a freshly built response. The nonzero-code-on-failure convention
/// from the reference device becomes a plain `Result`.
pub type ExecuteFn = fn(&mut Adu, &mut Device, &mut Runtime) -> Result<(), ExceptionCode>;

/// Placeholder used by registry rows for functions this crate does not
/// implement (`supported = false`); the dispatcher never calls these, since
/// it short-circuits on the `supported` flag before consulting them.
pub fn always_true(_adu: &Adu, _device: &Device) -> bool {
    true
}

pub fn unreachable_execute(_adu: &mut Adu, _device: &mut Device, _rt: &mut Runtime) -> Result<(), ExceptionCode> {
    debug_assert!(false, "execute called on an unsupported function code");
    Err(ExceptionCode::IllegalFunction)
}
