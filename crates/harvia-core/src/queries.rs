// GraphQL documents understood by the MyHarvia AppSync services.
//
// Query text, operation names, and variable names must match the backend
// byte-for-byte; AppSync caches by document.

use serde_json::{Map, Value};

use harvia_api::{GraphqlOperation, Service};

const DEVICE_TREE: &str = "query Query {\n  getDeviceTree\n}\n";

const DEVICE_STATE: &str = "query Query($deviceId: ID!) {\n  getDeviceState(deviceId: $deviceId) {\n    desired\n    reported\n    timestamp\n    __typename\n  }\n}\n";

const LATEST_DATA: &str = "query Query($deviceId: String!) {\n  getLatestData(deviceId: $deviceId) {\n    deviceId\n    timestamp\n    sessionId\n    type\n    data\n    __typename\n  }\n}\n";

const STATE_CHANGE: &str = "mutation Mutation($deviceId: ID!, $state: AWSJSON!, $getFullState: Boolean) {\n  requestStateChange(deviceId: $deviceId, state: $state, getFullState: $getFullState)\n}\n";

/// `getDeviceTree`, sent to the device service.
pub fn device_tree() -> (Service, GraphqlOperation) {
    (Service::Device, GraphqlOperation::new("Query", DEVICE_TREE))
}

/// `getDeviceState(deviceId: ID!)`, sent to the device service.
pub fn device_state(device_id: &str) -> (Service, GraphqlOperation) {
    (
        Service::Device,
        GraphqlOperation::new("Query", DEVICE_STATE).variable("deviceId", device_id),
    )
}

/// `getLatestData(deviceId: String!)`, sent to the data service.
pub fn latest_data(device_id: &str) -> (Service, GraphqlOperation) {
    (
        Service::Data,
        GraphqlOperation::new("Query", LATEST_DATA).variable("deviceId", device_id),
    )
}

/// `requestStateChange`, with the partial state JSON-encoded into the
/// `AWSJSON` variable and `getFullState` off.
pub fn state_change(device_id: &str, desired: &Map<String, Value>) -> (Service, GraphqlOperation) {
    (
        Service::Device,
        GraphqlOperation::new("Mutation", STATE_CHANGE)
            .variable("deviceId", device_id)
            .variable("state", Value::Object(desired.clone()).to_string())
            .variable("getFullState", false),
    )
}
