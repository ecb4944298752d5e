#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(asset) = foldcode::ModelAsset::from_bytes(data) {
        // Serialization must reach a fixed point after one round.
        let bytes = asset.to_bytes();
        let reloaded = foldcode::ModelAsset::from_bytes(&bytes).unwrap();
        assert_eq!(reloaded.to_bytes(), bytes);
    }
});
