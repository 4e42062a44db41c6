pub mod client;
pub mod transport;

pub use client::{UploadClient, UploadOutcome, VerificationReceipt, DATA_FIELD, VIDEO_FIELD};
pub use transport::{FilePart, HttpResponse, HttpTransport, MultipartForm, ReqwestTransport};

#[cfg(test)]
pub(crate) use transport::testing;
