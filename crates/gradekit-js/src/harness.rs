//! Mocked browser globals and the report the sandbox hands back.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Evaluated once per sandbox. Installs the mocked globals and evaluates to
/// the harness handle (`invoke`, `report`), which is never bound to a global
/// name so learner code cannot reach it.
///
/// `document.getElementById` hands out one proxy per id; every property write
/// through it lands on a plain target object and is appended to that target's
/// `_changes` log. `setTimeout` runs its callback immediately so DOM updates
/// scheduled by learner code are observable. `window` is the global object and
/// event listener registration is a no-op everywhere. Builtins the report
/// depends on are captured before learner code runs.
pub(crate) const HARNESS_PRELUDE: &str = r#"
(function (global) {
    var stringify = JSON.stringify;
    var parse = JSON.parse;
    var keys = Object.keys;
    var now = Date.now;
    var hasOwn = Object.prototype.hasOwnProperty;
    var create = Object.create;
    var makeFunction = Function;
    var ProxyCtor = Proxy;

    var targets = {};
    var proxies = {};
    var elementMethods = {
        addEventListener: function () {},
        removeEventListener: function () {},
        setAttribute: function (name, value) {
            this[String(name)] = String(value);
        },
        getAttribute: function (name) {
            var value = this[String(name)];
            return value === undefined ? null : value;
        }
    };
    var outcome = { status: 'pending' };

    function errorMessage(e) {
        if (e !== null && typeof e === 'object' && 'message' in e) {
            return String(e.message);
        }
        return String(e);
    }

    function settle(value) {
        outcome = { status: 'ok', value: value, isUndefined: value === undefined };
    }

    function fail(e) {
        outcome = { status: 'error', message: errorMessage(e) };
    }

    function element(id) {
        var key = String(id);
        if (!hasOwn.call(proxies, key)) {
            var target = create(elementMethods);
            target.id = key;
            target._changes = [];
            targets[key] = target;
            proxies[key] = new ProxyCtor(target, {
                set: function (obj, prop, value) {
                    obj[prop] = value;
                    var log = obj._changes;
                    log[log.length] = { property: String(prop), value: value, timestamp: now() };
                    return true;
                }
            });
        }
        return proxies[key];
    }

    function snapshot() {
        var elements = {};
        var ids = keys(targets);
        for (var i = 0; i < ids.length; i++) {
            var target = targets[ids[i]];
            var properties = {};
            var names = keys(target);
            for (var j = 0; j < names.length; j++) {
                if (names[j] !== '_changes') {
                    properties[names[j]] = target[names[j]];
                }
            }
            var changes = [];
            for (var k = 0; k < target._changes.length; k++) {
                var change = target._changes[k];
                changes[k] = { property: change.property, value: change.value, timestamp: change.timestamp };
            }
            elements[ids[i]] = { properties: properties, changes: changes };
        }
        return elements;
    }

    global.window = global;
    global.addEventListener = function () {};
    global.removeEventListener = function () {};

    global.document = {
        addEventListener: function () {},
        removeEventListener: function () {},
        getElementById: function (id) {
            return element(id);
        },
        querySelector: function (selector) {
            if (typeof selector === 'string' && selector.charAt(0) === '#') {
                return element(selector.slice(1));
            }
            return null;
        }
    };

    global.console = {
        log: function () {},
        info: function () {},
        warn: function () {},
        error: function () {},
        debug: function () {}
    };

    global.setTimeout = function (callback) {
        if (typeof callback === 'function') {
            callback.apply(null, Array.prototype.slice.call(arguments, 2));
        }
        return 0;
    };
    global.clearTimeout = function () {};
    global.setInterval = function () {
        return 0;
    };
    global.clearInterval = function () {};

    return {
        invoke: function (source, name, argsJson) {
            var fn;
            try {
                fn = makeFunction(source + '\nreturn ' + name + ';')();
            } catch (e) {
                fail(e);
                return;
            }
            if (typeof fn !== 'function') {
                outcome = { status: 'notCallable', actualType: typeof fn };
                return;
            }
            var result;
            try {
                result = fn.apply(null, parse(argsJson));
            } catch (e) {
                fail(e);
                return;
            }
            if (result !== null && typeof result === 'object' && typeof result.then === 'function') {
                outcome = { status: 'pending' };
                try {
                    result.then(settle, fail);
                } catch (e) {
                    fail(e);
                }
                return;
            }
            settle(result);
        },

        report: function () {
            var report = {
                status: outcome.status,
                value: outcome.value,
                isUndefined: outcome.isUndefined === true,
                message: outcome.message,
                actualType: outcome.actualType
            };
            try {
                report.elements = snapshot();
                return stringify(report);
            } catch (e) {
                return stringify({
                    status: 'error',
                    message: 'Result could not be serialized: ' + errorMessage(e)
                });
            }
        }
    };
})(globalThis)
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HarnessStatus {
    Ok,
    Error,
    NotCallable,
    Pending,
}

/// A property write recorded by the mock DOM.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordedChange {
    pub property: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// Final state of one mock element.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ElementSnapshot {
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub changes: Vec<RecordedChange>,
}

/// What one invocation produced.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarnessReport {
    pub status: HarnessStatus,
    /// The returned value; `null` when the function returned `undefined`.
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub is_undefined: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub actual_type: Option<String>,
    #[serde(default)]
    pub elements: IndexMap<String, ElementSnapshot>,
}
