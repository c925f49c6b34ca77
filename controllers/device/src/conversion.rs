//! Conversions between `Device` resources and Packet API payloads.

use crds::{DeviceObservation, DeviceParameters, DeviceState};
use packet_client::{DeviceCreateRequest, DeviceUpdateRequest, IpAddressAssignment};

/// Projects the desired parameters into a create request
pub fn create_request(params: &DeviceParameters) -> DeviceCreateRequest {
    DeviceCreateRequest {
        project_id: params.project_id.clone(),
        hostname: params.hostname.clone(),
        plan: params.plan.clone(),
        facility: vec![params.facility.clone()],
        operating_system: params.operating_system.clone(),
        billing_cycle: params.billing_cycle.clone(),
        userdata: params.userdata.clone(),
        tags: params.tags.clone(),
        locked: params.locked,
        ipxe_script_url: params.ipxe_script_url.clone(),
        always_pxe: params.always_pxe,
    }
}

/// Projects every mutable parameter into an update request (full desired state, not a diff)
pub fn update_request(params: &DeviceParameters) -> DeviceUpdateRequest {
    DeviceUpdateRequest {
        hostname: params.hostname.clone(),
        userdata: Some(params.userdata.clone().unwrap_or_default()),
        locked: Some(params.locked),
        tags: Some(params.tags.clone()),
        ipxe_script_url: Some(params.ipxe_script_url.clone().unwrap_or_default()),
        always_pxe: Some(params.always_pxe),
    }
}

/// Whether the remote device matches every mutable desired parameter.
///
/// Plan, facility, operating system, billing cycle and project cannot change
/// after creation and are not compared.
pub fn is_up_to_date(params: &DeviceParameters, remote: &packet_client::Device) -> bool {
    if let Some(hostname) = &params.hostname {
        if hostname != &remote.hostname {
            return false;
        }
    }
    if params.locked != remote.locked || params.always_pxe != remote.always_pxe {
        return false;
    }
    if !same_optional(params.userdata.as_deref(), remote.userdata.as_deref()) {
        return false;
    }
    if !same_optional(params.ipxe_script_url.as_deref(), remote.ipxe_script_url.as_deref()) {
        return false;
    }

    let mut desired_tags = params.tags.clone();
    let mut remote_tags = remote.tags.clone();
    desired_tags.sort();
    remote_tags.sort();
    desired_tags == remote_tags
}

// Absent and empty are the same value to the API.
fn same_optional(desired: Option<&str>, remote: Option<&str>) -> bool {
    desired.unwrap_or_default() == remote.unwrap_or_default()
}

/// Address of the first public IPv4 assignment, scanning in list order.
///
/// The API does not promise a stable order, so with several public IPv4
/// addresses the pick is only as stable as the response.
pub fn first_public_ipv4(network: &[IpAddressAssignment]) -> Option<&str> {
    network
        .iter()
        .find(|n| n.is_public_ipv4())
        .map(|n| n.address.as_str())
}

/// Formats a 0-100 percentage as a 0-1 fraction with 6 decimal places
pub fn provisioning_progress(percentage: f32) -> String {
    let fraction = (f64::from(percentage) / 100.0).clamp(0.0, 1.0);
    format!("{:.6}", fraction)
}

/// Observed attributes of a remote device
pub fn observation(remote: &packet_client::Device) -> DeviceObservation {
    DeviceObservation {
        id: Some(remote.id.clone()),
        hostname: Some(remote.hostname.clone()),
        href: Some(remote.href.clone()),
        state: Some(DeviceState::from(remote.state.as_str())),
        ipv4: first_public_ipv4(&remote.network).map(str::to_string),
        provisioning_progress: Some(provisioning_progress(
            remote.provisioning_percentage.unwrap_or_default(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{remote_device, test_parameters};

    fn ip(family: u8, public: bool, address: &str) -> IpAddressAssignment {
        IpAddressAssignment {
            address_family: family,
            public,
            address: address.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_request_projects_all_parameters() {
        let mut params = test_parameters();
        params.tags = vec!["web".to_string()];
        params.userdata = Some("#cloud-config".to_string());

        let request = create_request(&params);
        assert_eq!(request.project_id, "proj-1");
        assert_eq!(request.facility, vec!["ewr1".to_string()]);
        assert_eq!(request.plan, "c3.small.x86");
        assert_eq!(request.operating_system, "ubuntu_20_04");
        assert_eq!(request.tags, vec!["web".to_string()]);
        assert_eq!(request.userdata.as_deref(), Some("#cloud-config"));
    }

    #[test]
    fn test_update_request_sends_full_mutable_state() {
        let params = test_parameters();
        let request = update_request(&params);

        assert_eq!(request.hostname.as_deref(), Some("web-1"));
        assert_eq!(request.locked, Some(false));
        assert_eq!(request.tags, Some(vec![]));
        assert_eq!(request.userdata.as_deref(), Some(""));
        assert_eq!(request.always_pxe, Some(false));
    }

    #[test]
    fn test_up_to_date_ignores_immutable_drift() {
        let params = test_parameters();
        let mut remote = remote_device("dev-1", "active");
        remote.plan = Some(packet_client::Plan { id: None, slug: "m3.large.x86".to_string() });
        remote.facility = Some(packet_client::Facility { id: None, code: "sjc1".to_string() });
        remote.operating_system = None;
        remote.billing_cycle = Some("monthly".to_string());

        assert!(is_up_to_date(&params, &remote));
    }

    #[test]
    fn test_up_to_date_detects_mutable_drift() {
        let params = test_parameters();

        let mut remote = remote_device("dev-1", "active");
        remote.hostname = "renamed".to_string();
        assert!(!is_up_to_date(&params, &remote));

        let mut remote = remote_device("dev-1", "active");
        remote.locked = true;
        assert!(!is_up_to_date(&params, &remote));

        let mut remote = remote_device("dev-1", "active");
        remote.tags = vec!["extra".to_string()];
        assert!(!is_up_to_date(&params, &remote));

        let mut remote = remote_device("dev-1", "active");
        remote.userdata = Some("#!/bin/sh".to_string());
        assert!(!is_up_to_date(&params, &remote));
    }

    #[test]
    fn test_up_to_date_treats_absent_as_empty_and_ignores_tag_order() {
        let mut params = test_parameters();
        params.tags = vec!["b".to_string(), "a".to_string()];
        let mut remote = remote_device("dev-1", "active");
        remote.tags = vec!["a".to_string(), "b".to_string()];
        remote.userdata = Some(String::new());
        remote.ipxe_script_url = None;

        assert!(is_up_to_date(&params, &remote));
    }

    #[test]
    fn test_unset_hostname_accepts_generated_hostname() {
        let mut params = test_parameters();
        params.hostname = None;
        let mut remote = remote_device("dev-1", "active");
        remote.hostname = "generated-by-api".to_string();

        assert!(is_up_to_date(&params, &remote));
    }

    #[test]
    fn test_first_public_ipv4_wins_in_list_order() {
        let network = vec![
            ip(6, false, "fd00::1"),
            ip(4, true, "203.0.113.5"),
            ip(4, true, "203.0.113.6"),
        ];
        assert_eq!(first_public_ipv4(&network), Some("203.0.113.5"));
    }

    #[test]
    fn test_first_public_ipv4_skips_private_and_v6() {
        let network = vec![ip(4, false, "10.0.0.5"), ip(6, true, "2604:1380::1")];
        assert_eq!(first_public_ipv4(&network), None);
    }

    #[test]
    fn test_provisioning_progress_fixed_point() {
        assert_eq!(provisioning_progress(0.0), "0.000000");
        assert_eq!(provisioning_progress(50.0), "0.500000");
        assert_eq!(provisioning_progress(100.0), "1.000000");
        assert_eq!(provisioning_progress(150.0), "1.000000");
    }
}
