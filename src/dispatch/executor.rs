//! Device exchanges: single request or upload followed by select

use super::request::{Request, Route, correlation_token, remote_file_name, select_body};
use super::transport::{Reply, Transport};
use crate::Result;
use crate::farm::DeviceRecord;

/// Send one request to a device
///
/// # Errors
///
/// Returns error if the exchange fails at the transport level
pub async fn exchange(
    transport: &dyn Transport,
    device: &DeviceRecord,
    request: &Request,
) -> Result<Reply> {
    let url = device.url(&request.route.path());
    tracing::debug!(device = %device.id, %url, "sending device request");
    transport
        .post(&url, &device.api_key, request.body.as_ref())
        .await
}

/// Upload a file to a device, then select it and start printing
///
/// The select request is only sent once the upload has been answered with
/// a 2xx status; otherwise the upload reply is returned as is. On success
/// the select reply is returned.
///
/// # Errors
///
/// Returns error if either exchange fails at the transport level
pub async fn upload_then_select(
    transport: &dyn Transport,
    device: &DeviceRecord,
    file_name: &str,
    content: &[u8],
) -> Result<Reply> {
    let remote_name = remote_file_name(file_name, &correlation_token());
    let upload_url = device.url(&Route::Files.path());

    tracing::debug!(
        device = %device.id,
        remote_name = %remote_name,
        bytes = content.len(),
        "uploading file"
    );

    let uploaded = transport
        .upload(&upload_url, &device.api_key, &remote_name, content.to_vec())
        .await?;

    if !(200..300).contains(&uploaded.status) {
        tracing::warn!(
            device = %device.id,
            status = uploaded.status,
            "upload rejected, not selecting file"
        );
        return Ok(uploaded);
    }

    let select = Request {
        route: Route::File(remote_name),
        body: Some(select_body()),
    };
    exchange(transport, device, &select).await
}
