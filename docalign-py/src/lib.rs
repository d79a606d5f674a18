//! Python bindings for the docalign document rectification library.
//!
//! Images cross the boundary as `uint8` numpy arrays shaped `(H, W)` for
//! intensity or `(H, W, C)` with 1, 3 or 4 channels.

use numpy::ndarray::{ArrayD, IxDyn};
use numpy::{IntoPyArray, PyReadonlyArrayDyn, PyUntypedArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use docalign::{DocAlignError, Image, ScanConfig, Scanner};

/// Convert a DocAlignError to a Python exception.
fn to_py_err(err: DocAlignError) -> PyErr {
    match err {
        DocAlignError::InvalidImage { .. }
        | DocAlignError::InvalidDimensions { .. }
        | DocAlignError::BufferTooSmall { .. }
        | DocAlignError::BufferSizeMismatch { .. }
        | DocAlignError::InvalidConfig(_) => PyValueError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

fn image_from_array(array: &PyReadonlyArrayDyn<'_, u8>) -> PyResult<Image> {
    let shape = array.shape();
    let (height, width, channels) = match *shape {
        [h, w] => (h, w, 1),
        [h, w, c] => (h, w, c),
        _ => {
            return Err(PyValueError::new_err(
                "image must have shape (H, W) or (H, W, C)",
            ))
        }
    };
    // Logical (row-major) order regardless of the array's memory layout.
    let data: Vec<u8> = array.as_array().iter().copied().collect();
    Image::new(data, width, height, channels).map_err(to_py_err)
}

fn image_to_array<'py>(py: Python<'py>, image: Image) -> PyResult<Bound<'py, PyAny>> {
    let shape = if image.channels() == 1 {
        vec![image.height(), image.width()]
    } else {
        vec![image.height(), image.width(), image.channels()]
    };
    let array = ArrayD::from_shape_vec(IxDyn(&shape), image.into_raw())
        .map_err(|err| PyRuntimeError::new_err(err.to_string()))?;
    Ok(array.into_pyarray(py).into_any())
}

/// Align a photographed document to a template.
///
/// Args:
///     image: Photographed document, uint8 array (H, W) or (H, W, C).
///     template: Reference template, uint8 array (H, W) or (H, W, C).
///     feature_budget: Maximum keypoints per image (default: 500).
///     retain_fraction: Percentage of matches kept, 0 to 100 (default: 5.0).
///     parallel: Extract and match on worker threads (default: False).
///
/// Returns:
///     (rectified or None, matches visualization, error message or None)
#[pyfunction]
#[pyo3(signature = (image, template, feature_budget = 500, retain_fraction = 5.0, parallel = false))]
fn scan<'py>(
    py: Python<'py>,
    image: PyReadonlyArrayDyn<'py, u8>,
    template: PyReadonlyArrayDyn<'py, u8>,
    feature_budget: usize,
    retain_fraction: f64,
    parallel: bool,
) -> PyResult<(Option<Bound<'py, PyAny>>, Bound<'py, PyAny>, Option<String>)> {
    let image = image_from_array(&image)?;
    let template = image_from_array(&template)?;

    let scanner = Scanner::new(ScanConfig {
        feature_budget,
        retain_fraction,
        parallel,
        ..ScanConfig::default()
    })
    .map_err(to_py_err)?;
    let (rectified, visualization, message) = scanner
        .scan(&image, &template)
        .map_err(to_py_err)?
        .into_parts();

    let rectified = rectified.map(|img| image_to_array(py, img)).transpose()?;
    let visualization = image_to_array(py, visualization)?;
    Ok((rectified, visualization, message))
}

/// Load an image file as a uint8 array (H, W) or (H, W, 3).
#[pyfunction]
fn load_image<'py>(py: Python<'py>, path: &str) -> PyResult<Bound<'py, PyAny>> {
    let image = docalign::io::load_image(path).map_err(to_py_err)?;
    image_to_array(py, image)
}

/// Python module for docalign.
#[pymodule]
fn _docalign(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(scan, m)?)?;
    m.add_function(wrap_pyfunction!(load_image, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
