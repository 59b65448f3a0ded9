#[path = "integration/support.rs"]
mod support;
#[path = "integration/scenarios.rs"]
mod scenarios;
#[path = "integration/language.rs"]
mod language;
#[path = "integration/asyncs.rs"]
mod asyncs;
#[path = "integration/host_io.rs"]
mod host_io;
#[path = "integration/properties.rs"]
mod properties;
