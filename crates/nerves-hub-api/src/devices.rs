// Device and device-certificate endpoints.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use crate::client::NervesHubClient;
use crate::error::Error;
use crate::models::{Device, DeviceCertificate, Envelope};

/// Form body for device creation.
///
/// `tags` is always sent, empty when there are none; `description` is
/// omitted when absent.
#[derive(Debug, Serialize)]
struct CreateDeviceForm<'a> {
    identifier: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    tags: String,
}

#[derive(Debug, Serialize)]
struct CreateCertificateForm<'a> {
    identifier: &'a str,
    cert: String,
}

impl NervesHubClient {
    /// List every device in the product.
    pub async fn device_list(&self) -> Result<Envelope<Vec<Device>>, Error> {
        self.get(self.device_url(&[])?).await
    }

    /// Register a new device.
    ///
    /// `identifier` must be unique within the product. Tags are sent as a
    /// single comma-joined field.
    pub async fn device_create(
        &self,
        identifier: &str,
        description: Option<&str>,
        tags: Option<&[String]>,
    ) -> Result<Envelope<Device>, Error> {
        let form = CreateDeviceForm {
            identifier,
            description,
            tags: tags.map(|t| t.join(",")).unwrap_or_default(),
        };
        self.post_form(self.device_url(&[])?, &form).await
    }

    /// Delete a device. Returns `true` only when the server answers 204.
    ///
    /// The device still has to be destroyed in the NervesHub UI before
    /// its identifier can be reused.
    pub async fn device_delete(&self, identifier: &str) -> Result<bool, Error> {
        let status = self.delete(self.device_url(&[identifier])?).await?;
        Ok(status == reqwest::StatusCode::NO_CONTENT)
    }

    /// Upload a certificate for a device.
    ///
    /// `cert` is the PEM-encoded certificate; it is base64-encoded on the
    /// wire whatever its contents.
    pub async fn device_cert_create(
        &self,
        identifier: &str,
        cert: &[u8],
    ) -> Result<Envelope<DeviceCertificate>, Error> {
        let form = CreateCertificateForm {
            identifier,
            cert: STANDARD.encode(cert),
        };
        self.post_form(self.device_url(&[identifier, "certificates"])?, &form)
            .await
    }

    /// List the certificates associated with a device.
    pub async fn device_cert_list(
        &self,
        identifier: &str,
    ) -> Result<Envelope<Vec<DeviceCertificate>>, Error> {
        self.get(self.device_url(&[identifier, "certificates"])?)
            .await
    }
}
