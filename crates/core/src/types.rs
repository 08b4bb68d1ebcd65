/// Import jobs are keyed by client-facing UUID v4 strings.
pub type JobId = String;
