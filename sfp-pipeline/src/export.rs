use crate::{Result, Scene};
use ply_rs::{
    ply::{
        Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
        ScalarType,
    },
    writer::Writer,
};
use sfp_core::{nalgebra::Point3, Projective};
use std::io::Write;

const CAMERA_COLOR: [u8; 3] = [255, 0, 255];
const LANDMARK_COLOR: [u8; 3] = [255, 255, 255];

/// Writes the scene as an ASCII PLY point cloud.
///
/// Every triangulated landmark becomes a white vertex and every valid
/// camera center a magenta one, so the reconstruction and the capture rig
/// can be told apart in a viewer. Landmarks still at projective infinity
/// are skipped.
pub fn export_ply(mut writer: impl Write, scene: &Scene) -> Result<()> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header
        .comments
        .push("Structure from known camera poses".to_string());

    let mut vertex_element = ElementDef::new("vertex".to_string());
    for name in ["x", "y", "z"] {
        vertex_element.properties.add(PropertyDef::new(
            name.to_string(),
            PropertyType::Scalar(ScalarType::Double),
        ));
    }
    for name in ["red", "green", "blue"] {
        vertex_element.properties.add(PropertyDef::new(
            name.to_string(),
            PropertyType::Scalar(ScalarType::UChar),
        ));
    }
    ply.header.elements.add(vertex_element);

    let mut vertices: Vec<DefaultElement> = vec![];
    let mut add_vertex = |position: Point3<f64>, [red, green, blue]: [u8; 3]| {
        let mut vertex = DefaultElement::new();
        vertex.insert("x".to_string(), Property::Double(position.x));
        vertex.insert("y".to_string(), Property::Double(position.y));
        vertex.insert("z".to_string(), Property::Double(position.z));
        vertex.insert("red".to_string(), Property::UChar(red));
        vertex.insert("green".to_string(), Property::UChar(green));
        vertex.insert("blue".to_string(), Property::UChar(blue));
        vertices.push(vertex);
    };

    for view in scene.valid_views().collect::<Vec<_>>() {
        if let Some(center) = scene.camera_center(view) {
            add_vertex(center, CAMERA_COLOR);
        }
    }
    for landmark in &scene.landmarks {
        if let Some(position) = landmark.point.point() {
            add_vertex(position, LANDMARK_COLOR);
        }
    }

    ply.payload.insert("vertex".to_string(), vertices);
    Writer::new().write_ply(&mut writer, &mut ply)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Landmark;
    use sfp_core::nalgebra::{Point2, Rotation3, Vector2, Vector3};
    use sfp_core::{
        DescriberType, IntrinsicId, Pose, PoseId, ViewId, WorldPoint, WorldToCamera,
    };
    use sfp_pinhole::{CameraIntrinsics, CameraIntrinsicsK1Distortion};
    use std::collections::BTreeMap;

    #[test]
    fn exports_cameras_and_landmarks() {
        let mut scene = Scene::default();
        scene.intrinsics.insert(
            IntrinsicId(0),
            CameraIntrinsicsK1Distortion::new(
                CameraIntrinsics::identity()
                    .focals(Vector2::new(500.0, 500.0))
                    .principal_point(Point2::new(320.0, 240.0)),
                0.0,
            ),
        );
        scene.poses.insert(
            PoseId(0),
            WorldToCamera::from_parts(Vector3::new(0.0, 0.0, -2.0), Rotation3::identity()),
        );
        scene.views.insert(
            ViewId(0),
            crate::View {
                image_path: "0.png".into(),
                width: 640,
                height: 480,
                intrinsic: Some(IntrinsicId(0)),
                pose: Some(PoseId(0)),
            },
        );
        scene.landmarks.push(Landmark {
            point: WorldPoint::from_point(Point3::new(1.0, 2.0, 3.0)),
            describer: DescriberType::Akaze,
            observations: BTreeMap::new(),
        });

        let mut buffer = vec![];
        export_ply(&mut buffer, &scene).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("ply"));
        assert!(text.contains("format ascii 1.0"));
        assert!(text.contains("element vertex 2"));
        assert!(text.contains("255 0 255"));
        assert!(text.contains("1 2 3 255 255 255"));
    }
}
