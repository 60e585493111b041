use crate::{ImagePoint, KeyPoint};

/// Allows conversion between a point on an image and the camera's internal
/// projection, which can describe the bearing of the projection out of the
/// camera.
pub trait CameraModel {
    /// The internal projection type produced by calibration. For a pinhole
    /// camera this is a normalized image coordinate.
    type Projection;

    /// Converts a pixel location on the image into the camera projection.
    ///
    /// The projection's X axis points right, Y axis points down, and Z axis
    /// points forwards. The image point uses the same coordinate frame.
    fn calibrate<P>(&self, point: P) -> Self::Projection
    where
        P: ImagePoint;

    /// Converts the camera projection back into the pixel location on the
    /// image.
    fn uncalibrate(&self, projection: Self::Projection) -> KeyPoint;
}
