//! Canonical structured event names used across `nwdaf-streamer`.

// Subscription registry events.
pub const SUBSCRIBE_START: &str = "subscribe_start";
pub const SUBSCRIBE_OK: &str = "subscribe_ok";
pub const SUBSCRIBE_FAILED: &str = "subscribe_failed";
pub const SUBSCRIBE_ALREADY_ACTIVE: &str = "subscribe_already_active";
pub const SUBSCRIBE_REJECTED_REMOVAL_PENDING: &str = "subscribe_rejected_removal_pending";
pub const UNSUBSCRIBE_START: &str = "unsubscribe_start";
pub const UNSUBSCRIBE_OK: &str = "unsubscribe_ok";
pub const UNSUBSCRIBE_FAILED: &str = "unsubscribe_failed";
pub const UNSUBSCRIBE_NOT_SUBSCRIBED: &str = "unsubscribe_not_subscribed";

// Producer and directory client events.
pub const PRODUCER_REQUEST_SENT: &str = "producer_request_sent";
pub const PRODUCER_REQUEST_FAILED: &str = "producer_request_failed";
pub const DIRECTORY_REGISTER_OK: &str = "directory_register_ok";
pub const DIRECTORY_REGISTER_RETRY: &str = "directory_register_retry";
pub const DIRECTORY_REGISTER_FAILED: &str = "directory_register_failed";
pub const DIRECTORY_DISCOVER_OK: &str = "directory_discover_ok";
pub const DIRECTORY_DISCOVER_FAILED: &str = "directory_discover_failed";
pub const DIRECTORY_DEREGISTER_OK: &str = "directory_deregister_ok";
pub const DIRECTORY_DEREGISTER_FAILED: &str = "directory_deregister_failed";

// Notification routing events.
pub const NOTIFICATION_RECEIVE: &str = "notification_receive";
pub const NOTIFICATION_REJECTED: &str = "notification_rejected";
pub const NOTIFICATION_UNCORRELATED: &str = "notification_uncorrelated";
pub const NOTIFICATION_REPORT_DISPATCHED: &str = "notification_report_dispatched";
pub const NOTIFICATION_UNSUPPORTED_KIND: &str = "notification_unsupported_kind";
pub const AMF_STATUS_CHANGE: &str = "amf_status_change";
pub const AMF_STATUS_SUBSCRIBED: &str = "amf_status_subscribed";
pub const COMMAND_RECEIVE: &str = "command_receive";
pub const COMMAND_COMPLETE: &str = "command_complete";
pub const COMMAND_REJECTED: &str = "command_rejected";

// Sink events.
pub const SINK_QUEUE_FULL: &str = "sink_queue_full";
pub const SINK_QUEUE_CLOSED: &str = "sink_queue_closed";

// Runtime lifecycle events.
pub const STARTUP_BEGIN: &str = "startup_begin";
pub const STARTUP_TARGET_SKIPPED: &str = "startup_target_skipped";
pub const STARTUP_COMPLETE: &str = "startup_complete";
pub const LISTENER_BOUND: &str = "listener_bound";
pub const SHUTDOWN_BEGIN: &str = "shutdown_begin";
pub const SHUTDOWN_UNSUBSCRIBE_TIMEOUT: &str = "shutdown_unsubscribe_timeout";
pub const SHUTDOWN_COMPLETE: &str = "shutdown_complete";
