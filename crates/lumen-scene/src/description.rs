//! Scene description files.
//!
//! A [`SceneDescription`] is the serde form of a scene, written in TOML or
//! JSON. Vectors are plain `[x, y, z]` arrays; colors are `[r, g, b]` and
//! always opaque. [`SceneDescription::build`] validates it and produces the
//! `Pod` records the renderers consume.

use std::path::Path;

use lumen_math::{Color, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SceneError};
use crate::{
    Camera, Material, Plane, RenderParams, Sphere, DEFAULT_MAX_DEPTH, DEFAULT_SAMPLES_PER_PIXEL,
};

/// Image and sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Samples averaged per pixel.
    pub samples_per_pixel: u32,
    /// Bounce depth.
    pub max_depth: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            samples_per_pixel: DEFAULT_SAMPLES_PER_PIXEL,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Camera placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraDescription {
    /// Eye position.
    pub position: [f32; 3],
    /// Vertical field of view in degrees.
    pub fov: f32,
}

impl Default for CameraDescription {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            fov: 60.0,
        }
    }
}

/// Surface material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialDescription {
    /// Diffuse color.
    pub diffuse: [f32; 3],
    /// Emitted light.
    pub emittance: [f32; 3],
    /// Mirror-bounce probability.
    pub reflectance: f32,
}

impl Default for MaterialDescription {
    fn default() -> Self {
        Self {
            diffuse: [0.8, 0.8, 0.8],
            emittance: [0.0, 0.0, 0.0],
            reflectance: 0.0,
        }
    }
}

/// A sphere entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereDescription {
    /// Center point.
    pub center: [f32; 3],
    /// Radius.
    pub radius: f32,
    /// Material.
    #[serde(default)]
    pub material: MaterialDescription,
}

/// A plane entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneDescription {
    /// Any point on the plane.
    pub point: [f32; 3],
    /// Normal; need not be unit length.
    pub normal: [f32; 3],
    /// Material.
    #[serde(default)]
    pub material: MaterialDescription,
}

/// A complete scene as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    /// Image and sampling settings.
    pub render: RenderSettings,
    /// Camera placement.
    pub camera: CameraDescription,
    /// Spheres, in intersection order.
    pub spheres: Vec<SphereDescription>,
    /// Planes, in intersection order.
    pub planes: Vec<PlaneDescription>,
}

/// A validated scene ready to hand to a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Render parameters.
    pub params: RenderParams,
    /// Sphere records.
    pub spheres: Vec<Sphere>,
    /// Plane records.
    pub planes: Vec<Plane>,
}

fn point([x, y, z]: [f32; 3]) -> Vec4 {
    Vec4::point(x, y, z)
}

fn color([r, g, b]: [f32; 3]) -> Color {
    Color::rgb(r, g, b)
}

impl MaterialDescription {
    fn build(&self) -> Material {
        Material::new(color(self.diffuse), color(self.emittance), self.reflectance)
    }
}

impl SceneDescription {
    /// Parse a TOML scene.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Parse a JSON scene.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a scene file; `.json` files are parsed as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(&text),
            _ => Self::from_toml(&text),
        }
    }

    /// Serialize as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate and convert into renderer records.
    pub fn build(&self) -> Result<Scene> {
        let camera = Camera::new(point(self.camera.position), self.camera.fov);
        let params = RenderParams::new(self.render.width, self.render.height)
            .with_samples(self.render.samples_per_pixel)
            .with_max_depth(self.render.max_depth)
            .with_camera(camera);
        params.validate()?;

        let spheres = self
            .spheres
            .iter()
            .enumerate()
            .map(|(i, s)| {
                if !(s.radius.is_finite() && s.radius > 0.0) {
                    return Err(SceneError::InvalidGeometry(format!(
                        "sphere {i} has radius {}",
                        s.radius
                    )));
                }
                Ok(Sphere::new(point(s.center), s.radius, s.material.build()))
            })
            .collect::<Result<Vec<_>>>()?;

        let planes = self
            .planes
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let [x, y, z] = p.normal;
                if Vec4::direction(x, y, z).length3() == 0.0 {
                    return Err(SceneError::InvalidGeometry(format!(
                        "plane {i} has a zero normal"
                    )));
                }
                Ok(Plane::new(
                    point(p.point),
                    Vec4::direction(x, y, z),
                    p.material.build(),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Scene {
            params,
            spheres,
            planes,
        })
    }

    /// The built-in demo: three spheres in an open box lit from above.
    pub fn demo() -> Self {
        let diffuse = |rgb| MaterialDescription {
            diffuse: rgb,
            ..Default::default()
        };
        let plane = |point, normal, material| PlaneDescription {
            point,
            normal,
            material,
        };
        let sphere = |center, radius, material| SphereDescription {
            center,
            radius,
            material,
        };

        Self {
            render: RenderSettings::default(),
            camera: CameraDescription {
                position: [0.0, 1.0, 4.0],
                fov: 55.0,
            },
            spheres: vec![
                sphere(
                    [-1.3, 0.0, -1.0],
                    1.0,
                    MaterialDescription {
                        diffuse: [0.95, 0.95, 0.95],
                        reflectance: 1.0,
                        ..Default::default()
                    },
                ),
                sphere([1.2, -0.3, -0.4], 0.7, diffuse([0.85, 0.25, 0.2])),
                sphere(
                    [0.2, -0.6, 0.8],
                    0.4,
                    MaterialDescription {
                        diffuse: [0.3, 0.5, 0.9],
                        reflectance: 0.3,
                        ..Default::default()
                    },
                ),
            ],
            planes: vec![
                plane([0.0, -1.0, 0.0], [0.0, 1.0, 0.0], diffuse([0.75, 0.75, 0.7])),
                plane([0.0, 0.0, -3.5], [0.0, 0.0, 1.0], diffuse([0.7, 0.7, 0.75])),
                plane([-3.5, 0.0, 0.0], [1.0, 0.0, 0.0], diffuse([0.8, 0.3, 0.3])),
                plane([3.5, 0.0, 0.0], [-1.0, 0.0, 0.0], diffuse([0.3, 0.7, 0.35])),
                plane(
                    [0.0, 4.5, 0.0],
                    [0.0, -1.0, 0.0],
                    MaterialDescription {
                        diffuse: [0.5, 0.5, 0.5],
                        emittance: [1.0, 0.95, 0.85],
                        reflectance: 0.0,
                    },
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
[render]
width = 32
height = 16
samples_per_pixel = 4

[camera]
position = [0.0, 0.5, 3.0]

[[spheres]]
center = [0.0, 0.0, -2.0]
radius = 1.0
material = { diffuse = [1.0, 0.0, 0.0], reflectance = 0.25 }

[[planes]]
point = [0.0, -1.0, 0.0]
normal = [0.0, 2.0, 0.0]
"#;

    #[test]
    fn test_parse_toml() {
        let desc = SceneDescription::from_toml(SMALL).unwrap();
        assert_eq!(desc.render.width, 32);
        assert_eq!(desc.render.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(desc.camera.fov, 60.0);
        assert_eq!(desc.spheres.len(), 1);
        assert_eq!(desc.planes[0].material, MaterialDescription::default());

        let scene = desc.build().unwrap();
        assert_eq!(scene.params.samples_per_pixel, 4);
        assert_eq!(scene.params.camera.position, Vec4::point(0.0, 0.5, 3.0));
        assert_eq!(scene.spheres[0].material.reflectance, 0.25);
        assert_eq!(scene.planes[0].normal, Vec4::direction(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_json_matches_toml() {
        let desc = SceneDescription::demo();
        let json = desc.to_json().unwrap();
        assert_eq!(SceneDescription::from_json(&json).unwrap(), desc);
        let toml = desc.to_toml().unwrap();
        assert_eq!(SceneDescription::from_toml(&toml).unwrap(), desc);
    }

    #[test]
    fn test_demo_builds() {
        let scene = SceneDescription::demo().build().unwrap();
        assert_eq!(scene.spheres.len(), 3);
        assert_eq!(scene.planes.len(), 5);
        assert!(scene
            .planes
            .iter()
            .any(|p| p.material.emittance != Color::BLACK));
    }

    #[test]
    fn test_invalid_geometry() {
        let mut desc = SceneDescription::demo();
        desc.spheres[0].radius = -1.0;
        assert!(matches!(desc.build(), Err(SceneError::InvalidGeometry(_))));

        let mut desc = SceneDescription::demo();
        desc.planes[0].normal = [0.0; 3];
        assert!(matches!(desc.build(), Err(SceneError::InvalidGeometry(_))));
    }

    #[test]
    fn test_invalid_params() {
        let mut desc = SceneDescription::demo();
        desc.render.samples_per_pixel = 0;
        assert!(matches!(desc.build(), Err(SceneError::InvalidParams(_))));
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            SceneDescription::from_toml("render = 3"),
            Err(SceneError::Toml(_))
        ));
        assert!(matches!(
            SceneDescription::from_json("{"),
            Err(SceneError::Json(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SceneDescription::load("/nonexistent/scene.toml").unwrap_err();
        assert!(matches!(err, SceneError::Io(_)));
    }
}
