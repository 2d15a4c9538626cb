mod capture_time;
mod geo_point;
mod owner_id;
mod record_id;
mod record_state;
mod trip_id;
mod wait_time;

pub use capture_time::CaptureTime;
pub use geo_point::GeoPoint;
pub use owner_id::OwnerId;
pub use record_id::RecordId;
pub use record_state::RecordState;
pub use trip_id::TripId;
pub use wait_time::WaitTime;
