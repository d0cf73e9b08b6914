//! Raw event reading and sample assembly
//!
//! The kernel delivers fixed-size input-event records on the data node. A
//! burst for this sensor is a run of relative-motion records carrying the
//! magnitude, closed by a SYN record that acts as the commit marker for the
//! group. The hardware may interleave value and boundary records, so the
//! reader accumulates until SYN instead of trusting any single record.
//!
//! The state machine lives entirely within one invocation; nothing is
//! carried across read cycles. A burst that contains no magnitude record
//! leaves the previously held magnitude in place - that carry-over is
//! hardware-burst semantics, not an accident.

use std::io::Read;
use std::mem;

use tracing::trace;

use crate::constants::event::{EV_REL, EV_SYN, INPUT_MAX_BEFORE_SYN, REL_MISC};
use crate::constants::uv::BIAS;
use crate::error::{HalError, Result};

/// Size of one kernel input-event record.
pub const EVENT_RECORD_SIZE: usize = mem::size_of::<libc::input_event>();

/// Outcome of one read cycle, before it is committed to device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBurst {
    /// Bias-adjusted magnitude, if a magnitude record arrived in this burst.
    pub magnitude: Option<i32>,
    /// SYN timestamp in microseconds; 0 when the burst ended without SYN.
    pub fired_time_us: u64,
}

/// Read one burst of records up to the SYN boundary.
///
/// Each record is consumed with a single read; anything other than a full
/// record fails the cycle with `ShortRead`. A relative/miscellaneous record
/// updates the pending magnitude (bias already subtracted); SYN captures its
/// timestamp and ends the burst; any other classification fails the cycle
/// with `UnknownEvent`. At most [`INPUT_MAX_BEFORE_SYN`] records are
/// consumed - hitting the bound without SYN ends the cycle successfully
/// with a zero fired time.
pub fn read_burst<R: Read>(node: &mut R) -> Result<RawBurst> {
    let mut magnitude: Option<i32> = None;
    let mut fired_time_us = 0u64;
    let mut records = 0usize;

    while records < INPUT_MAX_BEFORE_SYN {
        let mut buf = [0u8; EVENT_RECORD_SIZE];
        let len = node.read(&mut buf)?;
        if len != EVENT_RECORD_SIZE {
            return Err(HalError::ShortRead {
                got: len,
                want: EVENT_RECORD_SIZE,
            });
        }
        records += 1;

        let ev = decode_record(&buf);
        if ev.type_ == EV_REL && ev.code == REL_MISC {
            magnitude = Some(ev.value - BIAS);
        } else if ev.type_ == EV_SYN {
            fired_time_us = timeval_us(&ev.time);
            break;
        } else {
            return Err(HalError::UnknownEvent {
                event_type: ev.type_,
                code: ev.code,
            });
        }
    }

    trace!(?magnitude, fired_time_us, records, "Burst complete");
    Ok(RawBurst {
        magnitude,
        fired_time_us,
    })
}

fn decode_record(buf: &[u8; EVENT_RECORD_SIZE]) -> libc::input_event {
    // SAFETY: input_event is plain old data with no invalid bit patterns,
    // and the buffer holds exactly one kernel-formatted record.
    unsafe { std::ptr::read_unaligned(buf.as_ptr() as *const libc::input_event) }
}

fn timeval_us(time: &libc::timeval) -> u64 {
    (time.tv_sec as u64) * 1_000_000 + time.tv_usec as u64
}

/// Build one kernel-formatted record; shared by the crate's tests.
#[cfg(test)]
pub(crate) fn encode_record(
    event_type: u16,
    code: u16,
    value: i32,
    tv_sec: i64,
    tv_usec: i64,
) -> Vec<u8> {
    let ev = libc::input_event {
        time: libc::timeval {
            tv_sec: tv_sec as _,
            tv_usec: tv_usec as _,
        },
        type_: event_type,
        code,
        value,
    };
    let mut buf = vec![0u8; EVENT_RECORD_SIZE];
    // SAFETY: reverse of decode_record; sizes match by construction.
    unsafe {
        std::ptr::copy_nonoverlapping(
            &ev as *const libc::input_event as *const u8,
            buf.as_mut_ptr(),
            EVENT_RECORD_SIZE,
        );
    }
    buf
}
