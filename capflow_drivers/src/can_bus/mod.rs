//! FDCAN wrapper for the field bus: one command frame in, one telemetry
//! frame out. Transmission is fire-and-forget; a full TX FIFO drops the
//! frame for that tick instead of retrying.

use core::num::{NonZeroU16, NonZeroU8};

use fdcan::{
    config::{InterruptLine, NominalBitTiming},
    filter::{StandardFilter, StandardFilterSlot},
    frame::{FrameFormat, TxFrameHeader},
    id::{Id, StandardId},
    interrupt::Interrupt,
    FdCan, NormalOperationMode, ReceiveOverrun,
};
use hal::{can::Can, pac::FDCAN1};

pub struct CanBus {
    can: FdCan<Can, NormalOperationMode>,
}

impl CanBus {
    /// Brings the peripheral up at 1 Mbit/s (16 tq per bit off the 16 MHz
    /// kernel clock after the prescaler), accepting standard frames into
    /// FIFO 0 with a new-message interrupt on line 0.
    pub fn new(fdcan: FDCAN1) -> Self {
        let mut can = FdCan::new(Can::new(fdcan)).into_config_mode();
        can.set_protocol_exception_handling(false);
        can.set_nominal_bit_timing(NominalBitTiming {
            prescaler: NonZeroU16::new(10).unwrap(),
            seg1: NonZeroU8::new(13).unwrap(),
            seg2: NonZeroU8::new(2).unwrap(),
            sync_jump_width: NonZeroU8::new(1).unwrap(),
        });
        can.set_standard_filter(
            StandardFilterSlot::_0,
            StandardFilter::accept_all_into_fifo0(),
        );
        can.enable_interrupt_line(InterruptLine::_0, true);
        can.enable_interrupt(Interrupt::RxFifo0NewMsg);

        CanBus {
            can: can.into_normal(),
        }
    }

    /// Queues one classic data frame. Dropped silently when the FIFO is full.
    pub fn send(&mut self, id: u16, data: &[u8; 8]) {
        let id = match StandardId::new(id) {
            Some(id) => id,
            None => return,
        };
        let header = TxFrameHeader {
            len: 8,
            frame_format: FrameFormat::Standard,
            id: Id::Standard(id),
            bit_rate_switching: false,
            marker: None,
        };
        let _ = self.can.transmit(header, data);
    }

    /// Drains one standard frame from FIFO 0, if any.
    pub fn receive(&mut self) -> Option<(u16, [u8; 8])> {
        let mut buffer = [0u8; 16];
        match self.can.receive0(&mut buffer) {
            Ok(ReceiveOverrun::NoOverrun(info)) | Ok(ReceiveOverrun::Overrun(info)) => {
                let id = match info.id {
                    Id::Standard(id) => id.as_raw(),
                    Id::Extended(_) => return None,
                };
                let mut data = [0u8; 8];
                data.copy_from_slice(&buffer[..8]);
                Some((id, data))
            }
            Err(_) => None,
        }
    }

    /// Clears the FIFO 0 new-message flag from the receive ISR.
    pub fn clear_rx_interrupt(&mut self) {
        self.can.clear_interrupt(Interrupt::RxFifo0NewMsg);
    }
}
