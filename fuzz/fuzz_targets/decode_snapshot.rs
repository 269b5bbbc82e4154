#![no_main]

use libfuzzer_sys::fuzz_target;

use hub_core::graphql::GraphqlResponse;
use hub_core::load::decode_snapshot;

fuzz_target!(|data: &[u8]| {
    let Ok(response) = serde_json::from_slice::<GraphqlResponse>(data) else {
        return;
    };
    let Ok(data) = response.into_data("GetOrganizations") else {
        return;
    };
    if let Ok(snapshot) = decode_snapshot(&data) {
        let counts = snapshot.counts();
        assert_eq!(counts.organizations, snapshot.organizations.len());
    }
});
