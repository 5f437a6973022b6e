pub mod booking;
pub mod hours;
pub mod room;

pub use booking::{Booking, BookingStatus, PaymentStatus};
pub use hours::{DayHours, OperatingHours};
pub use room::{Organization, Room};
