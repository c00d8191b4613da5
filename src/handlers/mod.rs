// Two security tiers: public session/auth endpoints (/auth/*) and
// session-guarded API endpoints (/api/*).
pub mod protected;
pub mod public;
