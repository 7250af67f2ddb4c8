#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|raw: typedef::RawSchema| {
    let _: Result<typedef::Schema, typedef::SchemaError> = raw.verify();
});
