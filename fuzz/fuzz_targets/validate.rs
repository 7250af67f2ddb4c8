#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (typedef::RawSchema, Vec<u8>)| {
    let (raw, instance_bytes) = input;

    // Only fuzz the walker against schemas that pass verification.
    let schema = match raw.verify() {
        Ok(schema) => schema,
        Err(_) => return,
    };

    if let Ok(instance) = serde_json::from_slice(&instance_bytes) {
        // Bound the depth so circular refs terminate.
        let options = typedef::ValidateOptions::new()
            .with_max_depth(32)
            .with_max_errors(64);
        let _ = typedef::validate(&schema, &instance, options);
    }
});
